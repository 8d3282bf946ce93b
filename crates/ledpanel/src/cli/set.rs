//! `set` subcommand — change one control on the device.

use super::{Config, Panel, Result, connect};
use ledpanel_lib::state::Control;
use ledpanel_lib::transport::TransportError;

pub(super) fn cmd_set(config: &Config, name: &str, value: Option<&str>) -> Result<()> {
    let control = Control::parse(name, value)?;
    let command = control.command();

    let transport = connect(config, config.connect_timeout())?;
    let mut panel = Panel::from_config(config);
    if !panel.set(control, &transport) {
        return Err(TransportError::NotConnected.into());
    }
    // Flushes the queued frame before closing.
    transport.shutdown();

    println!("Sent {}", command.encode(config.wire_format));
    Ok(())
}
