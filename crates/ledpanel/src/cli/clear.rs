//! `clear` subcommand — clear every cell on the device.

use super::{Config, Link, Result, connect};
use ledpanel_lib::protocol::Command;

pub(super) fn cmd_clear(config: &Config) -> Result<()> {
    let transport = connect(config, config.connect_timeout())?;
    transport.send(&Command::Clear)?;
    transport.shutdown();
    println!("Cleared {}", config.endpoint());
    Ok(())
}
