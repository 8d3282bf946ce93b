//! `monitor` subcommand — print device state as it changes, reconnecting on loss.

use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{
    Config, DeviceState, DeviceStateJson, Panel, RUNNING, Result, Transport, TransportEvent,
};

const EVENT_WAIT: Duration = Duration::from_millis(200);

/// One-line summary of the device state.
fn state_line(state: &DeviceState) -> String {
    let pattern = state.pattern_name().unwrap_or("unknown");
    let mut line = format!(
        "{} color={} hue={} sat={}% bri={} pattern={} ({pattern})",
        if state.on { "on " } else { "off" },
        state.color,
        state.hue,
        state.saturation,
        state.brightness,
        state.pattern,
    );
    if let Some(status) = &state.status {
        line.push_str(&format!(" status={status}"));
    }
    line
}

pub(super) fn cmd_monitor(config: &Config, json: bool) -> Result<()> {
    let transport = Transport::connect(config.transport_options());
    let mut panel = Panel::from_config(config);
    println!("[monitor] {} (Ctrl+C to stop)", transport.url());

    while RUNNING.load(Ordering::SeqCst) {
        let Some(event) = transport.next_event(EVENT_WAIT) else {
            continue;
        };
        match event {
            TransportEvent::Opened => {
                panel.handle_event(TransportEvent::Opened);
                println!("[connected] {}", transport.url());
                panel.request_sync(&transport);
            }
            TransportEvent::Closed { reason } => {
                println!(
                    "[disconnected] {reason}, retrying in {} ms",
                    config.reconnect_delay_ms
                );
                panel.handle_event(TransportEvent::Closed { reason });
            }
            message @ TransportEvent::Message(_) => {
                if !panel.handle_event(message) {
                    continue;
                }
                let state = panel.state();
                if json {
                    match serde_json::to_string(&DeviceStateJson::from(state)) {
                        Ok(line) => println!("{line}"),
                        Err(e) => log::warn!("JSON serialization failed: {e}"),
                    }
                } else {
                    println!("  {}", state_line(state));
                }
            }
        }
    }

    transport.shutdown();
    println!("[monitor] stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledpanel_lib::color::Rgb;

    #[test]
    fn state_line_default() {
        let line = state_line(&DeviceState::default());
        assert_eq!(
            line,
            "off color=#ff0000 hue=0 sat=100% bri=32 pattern=0 (color-fill)"
        );
    }

    #[test]
    fn state_line_with_status_and_unknown_pattern() {
        let state = DeviceState {
            on: true,
            color: Rgb::new(0, 0, 0xFF),
            pattern: 9,
            status: Some("ok".into()),
            ..Default::default()
        };
        let line = state_line(&state);
        assert!(line.starts_with("on  color=#0000ff"));
        assert!(line.contains("pattern=9 (unknown)"));
        assert!(line.ends_with(" status=ok"));
    }
}
