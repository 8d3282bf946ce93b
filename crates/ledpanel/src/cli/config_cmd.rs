//! `config` subcommand — show current configuration and file paths, or
//! write a starter file with `--init`.

use std::path::Path;

use super::{
    Config, ConfigInitOutput, ConfigOutput, PanelError, Result, kv, kv_indent, kv_width,
    print_json,
};
use ledpanel_lib::color::parse_color;

pub(super) fn cmd_config_init(
    config: &Config,
    custom_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let path = custom_path
        .map(Path::to_path_buf)
        .or_else(Config::path)
        .ok_or_else(|| PanelError::Config("No config directory; pass --config".into()))?;
    config.write_new(&path)?;
    if json {
        return print_json(&ConfigInitOutput {
            config_file: path.display().to_string(),
        });
    }
    println!("Wrote {}", path.display());
    Ok(())
}

pub(super) fn cmd_config(config: &Config, custom_path: Option<&Path>, json: bool) -> Result<()> {
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let problems: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };

    if json {
        return print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            endpoint: config.endpoint(),
            settings: config.clone(),
            problems,
        });
    }

    let w = kv_width(
        &["Config file:", "Log file:", "Endpoint:"],
        &[
            "host:",
            "grid:",
            "cell_size:",
            "addressing:",
            "wire_format:",
            "color_mode:",
            "reconnect_delay_ms:",
            "connect_timeout_ms:",
            "paint_color:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    match Config::log_path() {
        Some(p) => kv("Log file:", p.display(), w),
        None => kv("Log file:", "(no config directory)", w),
    }
    kv("Endpoint:", config.endpoint(), w);
    println!();

    println!("Settings:");
    kv_indent("host:", &config.host, w);
    kv_indent(
        "grid:",
        format_args!("{}x{}", config.grid_width, config.grid_height),
        w,
    );
    kv_indent("cell_size:", config.cell_size, w);
    kv_indent("addressing:", config.addressing, w);
    kv_indent("wire_format:", config.wire_format, w);
    kv_indent("color_mode:", config.color_mode, w);
    kv_indent("reconnect_delay_ms:", config.reconnect_delay_ms, w);
    kv_indent("connect_timeout_ms:", config.connect_timeout_ms, w);
    let color_display = match parse_color(&config.paint_color) {
        Ok(rgb) => format!("{} -> {rgb}", config.paint_color),
        Err(_) => format!("{} (invalid)", config.paint_color),
    };
    kv_indent("paint_color:", color_display, w);

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    Ok(())
}
