//! Pointer state machine — testable paint-stroke logic decoupled from I/O.
//!
//! The [`Painter`] turns pointer down/move/up into cells to paint and a
//! [`Stroke`] to send. Windowing code only has to translate its native
//! pointer events into [`PointerEvent`]s.

use crate::color::ColorValue;
use crate::grid::{Addressing, Cell, GridSize};
use crate::protocol::Command;

/// A pointer position relative to the canvas as the user sees it.
///
/// `offset_*` is the position inside the on-screen canvas and `client_*` is
/// the on-screen size, which may differ from the backing resolution when
/// the canvas is scaled to fit its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub offset_x: f64,
    pub offset_y: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl PointerEvent {
    /// An event on an unscaled canvas (on-screen size equals backing size).
    pub fn unscaled(x: f64, y: f64, backing: (u32, u32)) -> Self {
        PointerEvent {
            offset_x: x,
            offset_y: y,
            client_width: f64::from(backing.0),
            client_height: f64::from(backing.1),
        }
    }

    /// Rescale to backing pixels, truncating toward zero and clamping inside
    /// the surface.
    pub fn backing_position(&self, backing: (u32, u32)) -> (u32, u32) {
        let scale = |offset: f64, client: f64, size: u32| -> u32 {
            if size == 0 {
                return 0;
            }
            let scaled = if client > 0.0 {
                offset * f64::from(size) / client
            } else {
                0.0
            };
            // `as` saturates and maps NaN to 0.
            (scaled as u32).min(size - 1)
        };
        (
            scale(self.offset_x, self.client_width, backing.0),
            scale(self.offset_y, self.client_height, backing.1),
        )
    }

    /// The grid cell under the pointer.
    pub fn cell(&self, size: GridSize, cell_size: u32) -> Cell {
        let backing = (size.width * cell_size, size.height * cell_size);
        let (px, py) = self.backing_position(backing);
        let cell_size = cell_size.max(1);
        Cell::new(
            (px / cell_size).min(size.width.saturating_sub(1)),
            (py / cell_size).min(size.height.saturating_sub(1)),
        )
    }
}

/// The cells touched by one drag and the color captured when it started.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    color: ColorValue,
    cells: Vec<usize>,
    last: Option<Cell>,
}

impl Stroke {
    fn new(color: ColorValue) -> Self {
        Stroke {
            color,
            cells: Vec::new(),
            last: None,
        }
    }

    /// Brush color for the whole stroke.
    pub fn color(&self) -> ColorValue {
        self.color
    }

    /// Wire indices in the order they were first touched, without repeats.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The `grid` command that paints this stroke on the device.
    pub fn into_command(self) -> Command {
        Command::Grid {
            color: self.color.resolve(),
            cells: self.cells,
        }
    }
}

/// Pointer state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PainterState {
    #[default]
    Idle,
    Painting(Stroke),
}

/// Paint-stroke state machine.
#[derive(Debug, Clone)]
pub struct Painter {
    state: PainterState,
    size: GridSize,
    addressing: Addressing,
}

impl Painter {
    pub fn new(size: GridSize, addressing: Addressing) -> Self {
        Painter {
            state: PainterState::Idle,
            size,
            addressing,
        }
    }

    pub fn is_painting(&self) -> bool {
        matches!(self.state, PainterState::Painting(_))
    }

    pub fn state(&self) -> &PainterState {
        &self.state
    }

    /// Idle → Painting. Captures `color` for the whole stroke.
    ///
    /// Returns the cell to paint. A press while already painting restarts
    /// the stroke (the previous one is discarded unsent).
    pub fn press(&mut self, cell: Cell, color: ColorValue) -> Option<Cell> {
        if let PainterState::Painting(ref stroke) = self.state {
            log::debug!(
                "pointer pressed mid-stroke, dropping {} cells",
                stroke.len()
            );
        }
        self.state = PainterState::Painting(Stroke::new(color));
        self.visit(cell)
    }

    /// Feed a pointer move. Returns the cell to paint, or `None` when idle
    /// or still on the previous cell.
    pub fn drag(&mut self, cell: Cell) -> Option<Cell> {
        self.visit(cell)
    }

    /// Painting → Idle. Returns the finished stroke, or `None` when idle.
    pub fn release(&mut self) -> Option<Stroke> {
        match std::mem::take(&mut self.state) {
            PainterState::Painting(stroke) => Some(stroke),
            PainterState::Idle => None,
        }
    }

    /// Brush color of the stroke in progress.
    pub fn stroke_color(&self) -> Option<ColorValue> {
        match &self.state {
            PainterState::Painting(stroke) => Some(stroke.color),
            PainterState::Idle => None,
        }
    }

    fn visit(&mut self, cell: Cell) -> Option<Cell> {
        let PainterState::Painting(ref mut stroke) = self.state else {
            return None;
        };
        if stroke.last == Some(cell) {
            return None;
        }
        let index = self.addressing.to_index(self.size, cell)?;
        stroke.last = Some(cell);
        if !stroke.cells.contains(&index) {
            stroke.cells.push(index);
        }
        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    const SIZE: GridSize = GridSize::new(30, 15);

    fn red() -> ColorValue {
        ColorValue::Rgb(Rgb::new(0xFF, 0, 0))
    }

    fn row_major() -> Painter {
        Painter::new(SIZE, Addressing::RowMajor)
    }

    // ── PointerEvent ──

    #[test]
    fn unscaled_event_maps_to_cell() {
        let ev = PointerEvent::unscaled(85.0, 130.0, (1200, 600));
        assert_eq!(ev.cell(SIZE, 40), Cell::new(2, 3));
    }

    #[test]
    fn scaled_event_is_rescaled_to_backing() {
        // Canvas shown at half size: 600x300 on screen for 1200x600 backing.
        let ev = PointerEvent {
            offset_x: 45.0,
            offset_y: 65.0,
            client_width: 600.0,
            client_height: 300.0,
        };
        assert_eq!(ev.backing_position((1200, 600)), (90, 130));
        assert_eq!(ev.cell(SIZE, 40), Cell::new(2, 3));
    }

    #[test]
    fn backing_position_truncates() {
        let ev = PointerEvent {
            offset_x: 1.0,
            offset_y: 2.0,
            client_width: 3.0,
            client_height: 3.0,
        };
        // 1 * 40 / 3 = 13.33 → 13, 2 * 40 / 3 = 26.67 → 26
        assert_eq!(ev.backing_position((40, 40)), (13, 26));
    }

    #[test]
    fn event_on_far_edge_is_clamped() {
        let ev = PointerEvent::unscaled(1200.0, 600.0, (1200, 600));
        assert_eq!(ev.cell(SIZE, 40), Cell::new(29, 14));
        let ev = PointerEvent::unscaled(-5.0, -5.0, (1200, 600));
        assert_eq!(ev.cell(SIZE, 40), Cell::new(0, 0));
    }

    #[test]
    fn zero_client_size_maps_to_origin() {
        let ev = PointerEvent {
            offset_x: 50.0,
            offset_y: 50.0,
            client_width: 0.0,
            client_height: 0.0,
        };
        assert_eq!(ev.cell(SIZE, 40), Cell::new(0, 0));
    }

    // ── Painter ──

    #[test]
    fn starts_idle() {
        let p = row_major();
        assert!(!p.is_painting());
        assert_eq!(p.state(), &PainterState::Idle);
    }

    #[test]
    fn drag_while_idle_is_ignored() {
        let mut p = row_major();
        assert_eq!(p.drag(Cell::new(1, 1)), None);
        assert!(p.release().is_none());
    }

    #[test]
    fn press_paints_first_cell() {
        let mut p = row_major();
        assert_eq!(p.press(Cell::new(2, 3), red()), Some(Cell::new(2, 3)));
        assert!(p.is_painting());
        assert_eq!(p.stroke_color(), Some(red()));
    }

    #[test]
    fn repeated_cell_is_recorded_once() {
        let mut p = row_major();
        p.press(Cell::new(2, 3), red());
        assert_eq!(p.drag(Cell::new(3, 3)), Some(Cell::new(3, 3)));
        assert_eq!(p.drag(Cell::new(3, 3)), None);
        let stroke = p.release().unwrap();
        assert_eq!(stroke.cells(), &[92, 93]);
        assert_eq!(stroke.len(), 2);
    }

    #[test]
    fn revisited_cell_repaints_but_is_not_resent() {
        let mut p = row_major();
        p.press(Cell::new(2, 3), red());
        p.drag(Cell::new(3, 3));
        // Coming back to an earlier cell still repaints it.
        assert_eq!(p.drag(Cell::new(2, 3)), Some(Cell::new(2, 3)));
        let stroke = p.release().unwrap();
        assert_eq!(stroke.cells(), &[92, 93]);
    }

    #[test]
    fn stroke_uses_wire_addressing() {
        let mut p = Painter::new(SIZE, Addressing::Serpentine);
        p.press(Cell::new(0, 14), red());
        p.drag(Cell::new(0, 13));
        let stroke = p.release().unwrap();
        assert_eq!(stroke.cells(), &[0, 59]);
    }

    #[test]
    fn release_returns_to_idle() {
        let mut p = row_major();
        p.press(Cell::new(0, 0), red());
        assert!(p.release().is_some());
        assert!(!p.is_painting());
        assert!(p.release().is_none());
    }

    #[test]
    fn press_mid_stroke_restarts() {
        let mut p = row_major();
        p.press(Cell::new(0, 0), red());
        p.drag(Cell::new(1, 0));
        let blue = ColorValue::Rgb(Rgb::new(0, 0, 0xFF));
        p.press(Cell::new(5, 5), blue);
        let stroke = p.release().unwrap();
        assert_eq!(stroke.cells(), &[155]);
        assert_eq!(stroke.color(), blue);
    }

    #[test]
    fn out_of_grid_cell_is_ignored() {
        let mut p = row_major();
        p.press(Cell::new(0, 0), red());
        assert_eq!(p.drag(Cell::new(30, 0)), None);
        assert_eq!(p.release().unwrap().cells(), &[0]);
    }

    #[test]
    fn into_command_resolves_color() {
        let mut p = row_major();
        p.press(Cell::new(1, 0), ColorValue::Hsl(crate::color::Hsl::new(240, 100, 50)));
        let cmd = p.release().unwrap().into_command();
        assert_eq!(
            cmd,
            Command::Grid {
                color: Rgb::new(0, 0, 0xFF),
                cells: vec![1],
            }
        );
    }
}
