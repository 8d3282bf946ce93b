//! Application icon, drawn with the canvas renderer.

use eframe::egui;
use ledpanel_lib::color::{ColorValue, Hsl};
use ledpanel_lib::grid::{Cell, Grid, GridSize};
use ledpanel_lib::render::{Pixmap, Renderer};

const ICON_GRID: GridSize = GridSize::new(4, 4);
const ICON_CELL: u32 = 8;

/// A 4x4 grid with a hue sweep along the diagonal band.
fn icon_pixmap() -> Pixmap {
    let mut grid = Grid::new(ICON_GRID);
    for y in 0..ICON_GRID.height {
        for x in 0..ICON_GRID.width {
            if x.abs_diff(y) <= 1 {
                let hue = ((x + y) * 45) as u16;
                grid.set_cell(Cell::new(x, y), ColorValue::Hsl(Hsl::new(hue, 100, 50)));
            }
        }
    }
    let renderer = Renderer::new(ICON_CELL);
    let mut pixmap = Pixmap::for_grid(&renderer, ICON_GRID);
    renderer.render(&grid, &mut pixmap);
    pixmap
}

/// Icon for `ViewportBuilder::with_icon`.
pub fn app_icon() -> egui::IconData {
    let pixmap = icon_pixmap();
    let (width, height) = (pixmap.width(), pixmap.height());
    egui::IconData {
        rgba: pixmap.into_raw(),
        width,
        height,
    }
}
