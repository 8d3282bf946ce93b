//! Panel controller — the single owner of device state, grid, and stroke.
//!
//! Window and CLI front ends drive a [`Panel`] by passing it the
//! [`Link`] to send through and the [`Surface`] to draw on. Nothing here does
//! I/O of its own, so every interaction can be replayed in tests with
//! [`RecordingLink`](crate::transport::mock::RecordingLink) and a
//! [`Pixmap`](crate::render::Pixmap).

use crate::color::Rgb;
use crate::config::Config;
use crate::error::Result;
use crate::grid::{Addressing, Cell, Grid, GridSize};
use crate::pointer::{Painter, PointerEvent};
use crate::protocol::{Command, DeviceSnapshot};
use crate::render::{Renderer, Surface};
use crate::state::{ColorMode, Control, DeviceState};
use crate::transport::{Link, TransportEvent};

/// Construction parameters for a [`Panel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelOptions {
    pub size: GridSize,
    pub addressing: Addressing,
    pub color_mode: ColorMode,
    pub cell_size: u32,
}

impl Default for PanelOptions {
    fn default() -> Self {
        PanelOptions {
            size: GridSize::default(),
            addressing: Addressing::default(),
            color_mode: ColorMode::default(),
            cell_size: crate::render::DEFAULT_CELL_SIZE,
        }
    }
}

impl PanelOptions {
    pub fn from_config(config: &Config) -> Self {
        PanelOptions {
            size: config.grid_size(),
            addressing: config.addressing,
            color_mode: config.color_mode,
            cell_size: config.cell_size,
        }
    }
}

/// Outcome of [`Panel::pointer_up`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeEnd {
    /// Cells in the stroke.
    pub cells: usize,
    /// Whether the `grid` command reached the link.
    pub sent: bool,
}

pub struct Panel {
    state: DeviceState,
    grid: Grid,
    painter: Painter,
    renderer: Renderer,
    addressing: Addressing,
    color_mode: ColorMode,
    connected: bool,
}

impl Panel {
    pub fn new(options: PanelOptions) -> Self {
        Panel {
            state: DeviceState::default(),
            grid: Grid::new(options.size),
            painter: Painter::new(options.size, options.addressing),
            renderer: Renderer::new(options.cell_size),
            addressing: options.addressing,
            color_mode: options.color_mode,
            connected: false,
        }
    }

    /// A panel set up from `config`, with its brush color preselected.
    pub fn from_config(config: &Config) -> Self {
        let mut panel = Self::new(PanelOptions::from_config(config));
        panel.state.color = config.paint_color();
        panel
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = mode;
    }

    /// Change the picker color without notifying the device.
    pub fn set_brush_color(&mut self, color: Rgb) {
        self.state.color = color;
    }

    /// Whether the last transport event seen was an open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_painting(&self) -> bool {
        self.painter.is_painting()
    }

    /// Backing surface size in pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        self.renderer.surface_size(self.grid.size())
    }

    /// Startup: same as [`clear`](Self::clear).
    pub fn load(&mut self, link: &impl Link, surface: &mut impl Surface) {
        self.clear(link, surface);
    }

    /// Empty the grid, tell the device, and redraw.
    ///
    /// The device notification is best effort: when no connection is open
    /// it is dropped and only the local grid is cleared.
    pub fn clear(&mut self, link: &impl Link, surface: &mut impl Surface) {
        self.grid.clear();
        send(link, &Command::Clear);
        self.render(surface);
    }

    /// Apply a control change locally and send it. Returns `true` if sent.
    pub fn set(&mut self, control: Control, link: &impl Link) -> bool {
        control.apply_to(&mut self.state);
        send(link, &control.command())
    }

    /// Ask the device to broadcast its state.
    pub fn request_sync(&self, link: &impl Link) -> bool {
        send(link, &Command::Sync)
    }

    /// Start a stroke with the current brush color and paint the cell under
    /// the pointer.
    pub fn pointer_down(&mut self, event: &PointerEvent, surface: &mut impl Surface) -> Option<Cell> {
        let cell = self.cell_at(event);
        let color = self.state.active_color(self.color_mode);
        let painted = self.painter.press(cell, color);
        self.paint(painted, surface)
    }

    /// Continue the stroke. Ignored while idle.
    pub fn pointer_move(&mut self, event: &PointerEvent, surface: &mut impl Surface) -> Option<Cell> {
        if !self.painter.is_painting() {
            return None;
        }
        let cell = self.cell_at(event);
        let painted = self.painter.drag(cell);
        self.paint(painted, surface)
    }

    /// End the stroke and send it as one `grid` command. `None` when idle.
    pub fn pointer_up(&mut self, link: &impl Link) -> Option<StrokeEnd> {
        let stroke = self.painter.release()?;
        let cells = stroke.len();
        let sent = cells > 0 && send(link, &stroke.into_command());
        Some(StrokeEnd { cells, sent })
    }

    /// Apply an inbound text frame to the device state.
    pub fn handle_message(&mut self, text: &str) -> Result<DeviceSnapshot> {
        let snapshot = DeviceSnapshot::parse(text)?;
        let applied = self.state.apply(&snapshot);
        log::debug!("applied {applied} field(s) from device snapshot");
        Ok(snapshot)
    }

    /// Fold one transport event into the panel. Malformed messages are
    /// logged and dropped. Returns `true` when something visible changed.
    pub fn handle_event(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Opened => {
                self.connected = true;
                true
            }
            TransportEvent::Closed { .. } => {
                let changed = self.connected;
                self.connected = false;
                changed
            }
            TransportEvent::Message(text) => match self.handle_message(&text) {
                Ok(snapshot) => !snapshot.is_empty(),
                Err(e) => {
                    log::warn!("dropping device message: {e}");
                    false
                }
            },
        }
    }

    /// Redraw the whole canvas.
    pub fn render(&self, surface: &mut impl Surface) {
        self.renderer.render(&self.grid, surface);
    }

    fn cell_at(&self, event: &PointerEvent) -> Cell {
        event.cell(self.grid.size(), self.renderer.cell_size)
    }

    fn paint(&mut self, cell: Option<Cell>, surface: &mut impl Surface) -> Option<Cell> {
        let cell = cell?;
        let color = self.painter.stroke_color()?;
        self.grid.set_cell(cell, color);
        self.render(surface);
        Some(cell)
    }
}

fn send(link: &impl Link, command: &Command) -> bool {
    match link.send(command) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("dropping `{}` command: {e}", command.action());
            false
        }
    }
}
