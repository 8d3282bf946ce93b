//! `status` subcommand — connect, request a snapshot, and print the device state.

use std::time::{Duration, Instant};

use super::{
    Config, DeviceStateJson, Panel, PanelError, Result, StatusOutput, Transport, TransportEvent,
    connect, kv, kv_indent, kv_width, print_json,
};
use ledpanel_lib::transport::TransportError;

/// Wait for the first snapshot that actually carries state.
fn await_snapshot(panel: &mut Panel, transport: &Transport, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    panel.handle_event(TransportEvent::Opened);
    panel.request_sync(transport);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(PanelError::Transport(TransportError::Timeout(format!(
                "no state snapshot from {}",
                transport.url()
            ))));
        }
        match transport.next_event(left) {
            Some(TransportEvent::Message(text)) => match panel.handle_message(&text) {
                Ok(snapshot) if !snapshot.is_empty() => return Ok(()),
                Ok(_) => log::debug!("ignoring empty snapshot"),
                Err(e) => log::warn!("dropping device message: {e}"),
            },
            Some(TransportEvent::Closed { reason }) => {
                return Err(PanelError::Transport(TransportError::ConnectFailed(reason)));
            }
            Some(TransportEvent::Opened) | None => {}
        }
    }
}

pub(super) fn cmd_status(config: &Config, timeout: Duration, json: bool) -> Result<()> {
    let started = Instant::now();
    let transport = connect(config, timeout)?;
    let mut panel = Panel::from_config(config);
    await_snapshot(
        &mut panel,
        &transport,
        timeout.saturating_sub(started.elapsed()),
    )?;
    transport.shutdown();

    let state = panel.state();
    if json {
        return print_json(&StatusOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoint: config.endpoint(),
            connected: true,
            device: Some(DeviceStateJson::from(state)),
        });
    }

    let w = kv_width(
        &["Version:", "Endpoint:", "Device:"],
        &[
            "Power:",
            "Color:",
            "Hue:",
            "Saturation:",
            "Brightness:",
            "Pattern:",
            "Status:",
        ],
    );
    kv("Version:", env!("CARGO_PKG_VERSION"), w);
    kv("Endpoint:", config.endpoint(), w);
    println!();
    println!("Device:");
    kv_indent("Power:", if state.on { "on" } else { "off" }, w);
    kv_indent("Color:", state.color, w);
    kv_indent("Hue:", state.hue, w);
    kv_indent("Saturation:", format_args!("{}%", state.saturation), w);
    kv_indent("Brightness:", state.brightness, w);
    match state.pattern_name() {
        Some(name) => kv_indent("Pattern:", format_args!("{} ({name})", state.pattern), w),
        None => kv_indent("Pattern:", format_args!("{} (unknown)", state.pattern), w),
    }
    if let Some(status) = &state.status {
        kv_indent("Status:", status, w);
    }
    Ok(())
}
