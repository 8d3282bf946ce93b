//! LedPanel — control panel core for WebSocket-driven LED matrix devices.

pub mod color;
pub mod config;
pub mod error;
pub mod grid;
pub mod panel;
pub mod pointer;
pub mod protocol;
pub mod reconnect;
pub mod render;
pub mod state;
pub mod transport;

pub use error::PanelError;
