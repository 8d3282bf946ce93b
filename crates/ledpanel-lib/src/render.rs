//! Canvas renderer — draws the grid onto a [`Surface`].
//!
//! A full redraw clears the surface, fills every painted cell, then strokes
//! the grid lines on top so they stay visible over painted cells.

use crate::color::Rgb;
use crate::grid::{Grid, GridSize};

pub const DEFAULT_CELL_SIZE: u32 = 40;
/// Neutral gray used for the grid lines.
pub const GRID_LINE_COLOR: Rgb = Rgb::new(0x8A, 0x8E, 0x91);
pub const GRID_LINE_WIDTH: u32 = 2;

/// Axis-aligned rectangle in backing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Anything the renderer can draw on.
pub trait Surface {
    /// Erase the whole surface to transparent.
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Rgb);
    /// Stroke a line centred on the segment `from`–`to`.
    fn stroke_line(&mut self, from: (u32, u32), to: (u32, u32), color: Rgb, width: u32);
}

/// Grid renderer with fixed cell size and line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    pub cell_size: u32,
    pub line_color: Rgb,
    pub line_width: u32,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(DEFAULT_CELL_SIZE)
    }
}

impl Renderer {
    pub fn new(cell_size: u32) -> Self {
        Renderer {
            cell_size,
            line_color: GRID_LINE_COLOR,
            line_width: GRID_LINE_WIDTH,
        }
    }

    /// Backing surface size `(W * cell, H * cell)` in pixels.
    pub fn surface_size(&self, size: GridSize) -> (u32, u32) {
        (size.width * self.cell_size, size.height * self.cell_size)
    }

    /// Redraw the whole grid.
    pub fn render(&self, grid: &Grid, surface: &mut impl Surface) {
        surface.clear();
        self.draw_cells(grid, surface);
        self.draw_lines(grid.size(), surface);
    }

    fn draw_cells(&self, grid: &Grid, surface: &mut impl Surface) {
        for (cell, value) in grid.painted() {
            let rect = Rect {
                x: cell.x * self.cell_size,
                y: cell.y * self.cell_size,
                width: self.cell_size,
                height: self.cell_size,
            };
            surface.fill_rect(rect, value.resolve());
        }
    }

    fn draw_lines(&self, size: GridSize, surface: &mut impl Surface) {
        let (w, h) = self.surface_size(size);
        for x in 0..=size.width {
            let px = x * self.cell_size;
            surface.stroke_line((px, 0), (px, h), self.line_color, self.line_width);
        }
        for y in 0..=size.height {
            let py = y * self.cell_size;
            surface.stroke_line((0, py), (w, py), self.line_color, self.line_width);
        }
    }
}

// ── Pixel buffer surface ──

/// RGBA8 pixel buffer. A cleared pixmap is fully transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Pixmap {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// A pixmap sized for `renderer` drawing a grid of `size`.
    pub fn for_grid(renderer: &Renderer, size: GridSize) -> Self {
        let (w, h) = renderer.surface_size(size);
        Pixmap::new(w, h)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Fill the half-open signed box `[x0, x1) x [y0, y1)`, clipped to the buffer.
    fn fill_box(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb) {
        let x0 = x0.clamp(0, i64::from(self.width)) as u32;
        let x1 = x1.clamp(0, i64::from(self.width)) as u32;
        let y0 = y0.clamp(0, i64::from(self.height)) as u32;
        let y1 = y1.clamp(0, i64::from(self.height)) as u32;
        let rgba = [color.r, color.g, color.b, 0xFF];
        for y in y0..y1 {
            for x in x0..x1 {
                let i = self.offset(x, y);
                self.data[i..i + 4].copy_from_slice(&rgba);
            }
        }
    }
}

impl Surface for Pixmap {
    fn clear(&mut self) {
        self.data.fill(0);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.fill_box(
            i64::from(rect.x),
            i64::from(rect.y),
            i64::from(rect.x) + i64::from(rect.width),
            i64::from(rect.y) + i64::from(rect.height),
            color,
        );
    }

    fn stroke_line(&mut self, from: (u32, u32), to: (u32, u32), color: Rgb, width: u32) {
        let half = i64::from(width / 2);
        let extra = i64::from(width % 2);
        let (x0, y0) = (i64::from(from.0), i64::from(from.1));
        let (x1, y1) = (i64::from(to.0), i64::from(to.1));

        if x0 == x1 || y0 == y1 {
            // Axis-aligned: one band of `width` pixels centred on the segment.
            let (lx, hx) = (x0.min(x1), x0.max(x1));
            let (ly, hy) = (y0.min(y1), y0.max(y1));
            if x0 == x1 {
                self.fill_box(lx - half, ly, lx + half + extra, hy, color);
            } else {
                self.fill_box(lx, ly - half, hx, ly + half + extra, color);
            }
            return;
        }

        // General segment: stamp a width x width square at every step.
        let steps = (x1 - x0).abs().max((y1 - y0).abs());
        for s in 0..=steps {
            let x = x0 + (x1 - x0) * s / steps;
            let y = y0 + (y1 - y0) * s / steps;
            self.fill_box(x - half, y - half, x + half + extra, y + half + extra, color);
        }
    }
}

// ── Recorded draw operations ──

/// One recorded drawing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOp {
    Clear,
    Fill {
        rect: Rect,
        color: Rgb,
    },
    Line {
        from: (u32, u32),
        to: (u32, u32),
        color: Rgb,
        width: u32,
    },
}

/// A surface that records operations so another backend can replay them.
///
/// `clear` discards everything recorded so far, so the list always holds
/// exactly one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayList {
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn fills(&self) -> impl Iterator<Item = (Rect, Rgb)> + '_ {
        self.ops.iter().filter_map(|op| match *op {
            DrawOp::Fill { rect, color } => Some((rect, color)),
            _ => None,
        })
    }

    pub fn line_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .count()
    }
}

impl Surface for DisplayList {
    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.ops.push(DrawOp::Fill { rect, color });
    }

    fn stroke_line(&mut self, from: (u32, u32), to: (u32, u32), color: Rgb, width: u32) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            color,
            width,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorValue, Hsl};
    use crate::grid::Cell;

    const SIZE: GridSize = GridSize::new(30, 15);
    const LINE: [u8; 4] = [0x8A, 0x8E, 0x91, 0xFF];

    fn red() -> ColorValue {
        ColorValue::Rgb(Rgb::new(0xFF, 0, 0))
    }

    #[test]
    fn surface_size_is_grid_times_cell() {
        assert_eq!(Renderer::default().surface_size(SIZE), (1200, 600));
    }

    #[test]
    fn display_list_order_clear_fills_lines() {
        let mut grid = Grid::new(SIZE);
        grid.set_cell(Cell::new(2, 3), red());
        grid.set_cell(Cell::new(4, 0), red());
        let mut list = DisplayList::new();
        Renderer::default().render(&grid, &mut list);

        let ops = list.ops();
        assert_eq!(ops[0], DrawOp::Clear);
        assert!(matches!(ops[1], DrawOp::Fill { .. }));
        assert!(matches!(ops[2], DrawOp::Fill { .. }));
        assert!(ops[3..].iter().all(|op| matches!(op, DrawOp::Line { .. })));
        assert_eq!(list.line_count(), 31 + 16);
    }

    #[test]
    fn fill_rect_position_and_size() {
        let mut grid = Grid::new(SIZE);
        grid.set_cell(Cell::new(2, 3), red());
        let mut list = DisplayList::new();
        Renderer::default().render(&grid, &mut list);
        let fills: Vec<_> = list.fills().collect();
        assert_eq!(
            fills,
            vec![(
                Rect {
                    x: 80,
                    y: 120,
                    width: 40,
                    height: 40
                },
                Rgb::new(0xFF, 0, 0)
            )]
        );
    }

    #[test]
    fn hsl_cells_are_resolved() {
        let mut grid = Grid::new(SIZE);
        grid.set_cell(Cell::new(0, 0), ColorValue::Hsl(Hsl::new(120, 100, 50)));
        let mut list = DisplayList::new();
        Renderer::default().render(&grid, &mut list);
        let (_, color) = list.fills().next().unwrap();
        assert_eq!(color, Rgb::new(0, 0xFF, 0));
    }

    #[test]
    fn lines_use_gray_width_two() {
        let mut list = DisplayList::new();
        Renderer::default().render(&Grid::new(SIZE), &mut list);
        for op in list.ops().iter().skip(1) {
            match op {
                DrawOp::Line { color, width, .. } => {
                    assert_eq!(*color, GRID_LINE_COLOR);
                    assert_eq!(*width, 2);
                }
                other => panic!("unexpected op {other:?}"),
            }
        }
    }

    #[test]
    fn display_list_clear_discards_previous_frame() {
        let mut list = DisplayList::new();
        let r = Renderer::default();
        r.render(&Grid::new(SIZE), &mut list);
        let first = list.ops().len();
        r.render(&Grid::new(SIZE), &mut list);
        assert_eq!(list.ops().len(), first);
    }

    #[test]
    fn clear_grid_renders_only_lines() {
        let mut grid = Grid::new(SIZE);
        grid.set_cell(Cell::new(5, 5), red());
        grid.clear();
        let r = Renderer::default();
        let mut pix = Pixmap::for_grid(&r, SIZE);
        r.render(&grid, &mut pix);

        for y in 0..pix.height() {
            for x in 0..pix.width() {
                let p = pix.pixel(x, y).unwrap();
                assert!(p == LINE || p == [0, 0, 0, 0], "({x}, {y}) = {p:?}");
            }
        }
        // Cell interior is transparent, boundaries are gray.
        assert_eq!(pix.pixel(220, 220), Some([0, 0, 0, 0]));
        assert_eq!(pix.pixel(40, 220), Some(LINE));
        assert_eq!(pix.pixel(39, 220), Some(LINE));
        assert_eq!(pix.pixel(41, 220), Some([0, 0, 0, 0]));
    }

    #[test]
    fn painted_cell_interior_and_lines_over_it() {
        let mut grid = Grid::new(SIZE);
        grid.set_cell(Cell::new(1, 1), red());
        let r = Renderer::default();
        let mut pix = Pixmap::for_grid(&r, SIZE);
        r.render(&grid, &mut pix);
        assert_eq!(pix.pixel(60, 60), Some([0xFF, 0, 0, 0xFF]));
        // The boundary line is drawn after the fill.
        assert_eq!(pix.pixel(40, 60), Some(LINE));
        assert_eq!(pix.pixel(60, 79), Some(LINE));
    }

    #[test]
    fn outer_lines_are_clipped_to_the_surface() {
        let r = Renderer::default();
        let mut pix = Pixmap::for_grid(&r, SIZE);
        r.render(&Grid::new(SIZE), &mut pix);
        assert_eq!(pix.pixel(0, 300), Some(LINE));
        assert_eq!(pix.pixel(1199, 300), Some(LINE));
        assert_eq!(pix.pixel(600, 599), Some(LINE));
        assert_eq!(pix.pixel(1200, 300), None);
    }

    #[test]
    fn render_is_idempotent() {
        let mut grid = Grid::new(SIZE);
        grid.set_cell(Cell::new(3, 7), red());
        grid.set_cell(Cell::new(29, 14), ColorValue::Hsl(Hsl::new(200, 50, 50)));
        let r = Renderer::default();
        let mut a = Pixmap::for_grid(&r, SIZE);
        r.render(&grid, &mut a);
        let snapshot = a.clone();
        r.render(&grid, &mut a);
        assert_eq!(a, snapshot);
    }

    #[test]
    fn diagonal_line_stamps_endpoints() {
        let mut pix = Pixmap::new(10, 10);
        pix.stroke_line((1, 1), (8, 8), Rgb::WHITE, 1);
        assert_eq!(pix.pixel(1, 1), Some([0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(pix.pixel(8, 8), Some([0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(pix.pixel(1, 8), Some([0, 0, 0, 0]));
    }
}
