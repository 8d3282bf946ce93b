//! `paint` subcommand — replay cells as one pointer stroke.

use std::path::{Path, PathBuf};

use super::{Config, Link, PaintOutput, Panel, PanelError, Result, connect, print_json};
use ledpanel_lib::color::parse_color;
use ledpanel_lib::grid::{Cell, GridSize};
use ledpanel_lib::pointer::PointerEvent;
use ledpanel_lib::render::Pixmap;
use ledpanel_lib::state::ColorMode;
use ledpanel_lib::transport::TransportError;
use ledpanel_lib::transport::mock::RecordingLink;

pub(super) struct PaintArgs {
    pub color: Option<String>,
    pub cells: Vec<String>,
    pub preview: Option<PathBuf>,
    pub dry_run: bool,
}

/// Parse `X,Y` and check it lies inside the grid.
fn parse_cell(s: &str, size: GridSize) -> Result<Cell> {
    let invalid = || PanelError::Config(format!("Invalid cell: {s} (expected X,Y)"));
    let (x, y) = s.split_once(',').ok_or_else(invalid)?;
    let x: u32 = x.trim().parse().map_err(|_| invalid())?;
    let y: u32 = y.trim().parse().map_err(|_| invalid())?;
    let cell = Cell::new(x, y);
    if !size.contains(cell) {
        return Err(PanelError::Config(format!(
            "Cell ({x}, {y}) is outside the {}x{} grid",
            size.width, size.height
        )));
    }
    Ok(cell)
}

/// Pointer event at the centre of `cell` on an unscaled canvas.
fn center_of(cell: Cell, panel: &Panel) -> PointerEvent {
    let cs = f64::from(panel.renderer().cell_size);
    PointerEvent::unscaled(
        (f64::from(cell.x) + 0.5) * cs,
        (f64::from(cell.y) + 0.5) * cs,
        panel.surface_size(),
    )
}

/// Drive one stroke through `panel`. Returns the stroke's wire indices and
/// whether its `grid` command was sent.
fn stroke(
    panel: &mut Panel,
    cells: &[Cell],
    link: &impl Link,
    pixmap: &mut Pixmap,
) -> (Vec<usize>, bool) {
    let size = panel.grid().size();
    let addressing = panel.addressing();
    let mut indices = Vec::new();
    for (i, &cell) in cells.iter().enumerate() {
        let ev = center_of(cell, panel);
        if i == 0 {
            panel.pointer_down(&ev, pixmap);
        } else {
            panel.pointer_move(&ev, pixmap);
        }
        if let Some(index) = addressing.to_index(size, cell)
            && !indices.contains(&index)
        {
            indices.push(index);
        }
    }
    let sent = panel.pointer_up(link).is_some_and(|end| end.sent);
    (indices, sent)
}

fn save_png(pixmap: Pixmap, path: &Path) -> Result<()> {
    let (w, h) = (pixmap.width(), pixmap.height());
    let img = image::RgbaImage::from_raw(w, h, pixmap.into_raw())
        .ok_or_else(|| PanelError::Config("pixel buffer does not match its size".into()))?;
    img.save(path)
        .map_err(|e| PanelError::Io(std::io::Error::other(format!("{}: {e}", path.display()))))
}

pub(super) fn cmd_paint(config: &Config, args: PaintArgs, json: bool) -> Result<()> {
    let mut panel = Panel::from_config(config);
    let size = panel.grid().size();
    let cells = args
        .cells
        .iter()
        .map(|s| parse_cell(s, size))
        .collect::<Result<Vec<_>>>()?;
    let color = match &args.color {
        Some(c) => parse_color(c)?,
        None => config.paint_color(),
    };
    panel.set_color_mode(ColorMode::Rgb);
    panel.set_brush_color(color);

    let mut pixmap = Pixmap::for_grid(panel.renderer(), size);
    panel.render(&mut pixmap);

    let indices = if args.dry_run {
        let link = RecordingLink::new();
        let (indices, _) = stroke(&mut panel, &cells, &link, &mut pixmap);
        if !json {
            for command in link.take() {
                println!("would send {}", command.encode(config.wire_format));
            }
        }
        indices
    } else {
        let transport = connect(config, config.connect_timeout())?;
        let (indices, sent) = stroke(&mut panel, &cells, &transport, &mut pixmap);
        transport.shutdown();
        if !sent {
            return Err(TransportError::NotConnected.into());
        }
        if !json {
            println!("Painted {} cell(s) with {color}", indices.len());
        }
        indices
    };

    if let Some(path) = &args.preview {
        save_png(pixmap, path)?;
        if !json {
            println!("Preview written to {}", path.display());
        }
    }

    if json {
        return print_json(&PaintOutput {
            color: color.to_hex(),
            cells: indices,
            sent: !args.dry_run,
            preview: args.preview.as_ref().map(|p| p.display().to_string()),
        });
    }
    Ok(())
}
