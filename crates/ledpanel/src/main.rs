//! LedPanel — desktop control panel for WebSocket-driven LED matrices.
//!
//! GUI subsystem: opens the panel window. Use ledpanel-cli for scripting.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod icon;
mod panel_window;

use ledpanel_lib::config::Config;

/// Initialize the window app logger, directing output to a log file.
///
/// Falls back to stderr if the log file can't be opened.
fn init_window_logger() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_target(false);

    if let Some(log_path) = Config::log_path() {
        if let Some(dir) = log_path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(file) = std::fs::File::create(&log_path) {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }

    builder.init();
}

fn main() {
    init_window_logger();

    let (config, warnings) = Config::load_with_warnings();
    for w in &warnings {
        log::warn!("[config] {w}");
    }
    if let Err(problems) = config.validate() {
        for p in &problems {
            log::warn!("[config] {p}");
        }
    }

    if let Err(e) = panel_window::run(config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
