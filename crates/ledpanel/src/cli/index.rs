//! `index` subcommand — show the wire index of a cell.

use super::{Config, IndexOutput, PanelError, Result, kv, kv_width, print_json};
use ledpanel_lib::grid::{Addressing, Cell};

pub(super) fn cmd_index(config: &Config, x: u32, y: u32, json: bool) -> Result<()> {
    let size = config.grid_size();
    let cell = Cell::new(x, y);
    let (Some(row_major), Some(serpentine)) = (
        Addressing::RowMajor.to_index(size, cell),
        Addressing::Serpentine.to_index(size, cell),
    ) else {
        return Err(PanelError::Config(format!(
            "Cell ({x}, {y}) is outside the {}x{} grid",
            size.width, size.height
        )));
    };

    let output = IndexOutput {
        x,
        y,
        row_major,
        serpentine,
    };
    if json {
        return print_json(&output);
    }

    let w = kv_width(&["Cell:", "row-major:", "serpentine:"], &[]);
    kv("Cell:", format_args!("({x}, {y})"), w);
    for (addressing, index) in [
        (Addressing::RowMajor, output.row_major),
        (Addressing::Serpentine, output.serpentine),
    ] {
        let marker = if addressing == config.addressing {
            " (configured)"
        } else {
            ""
        };
        kv(&format!("{addressing}:"), format_args!("{index}{marker}"), w);
    }
    Ok(())
}
