//! Grid state — the LED matrix as a row-major array of optional colors.
//!
//! Cells are stored row-major (screen order, row 0 at the top). The index the
//! device expects depends on how the strand is wired, see [`Addressing`].

use serde::{Deserialize, Serialize};

use crate::color::ColorValue;

pub const DEFAULT_WIDTH: u32 = 30;
pub const DEFAULT_HEIGHT: u32 = 15;

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl Default for GridSize {
    fn default() -> Self {
        GridSize {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        GridSize { width, height }
    }

    pub const fn len(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub const fn contains(self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }
}

/// A cell coordinate in screen order (x to the right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub const fn new(x: u32, y: u32) -> Self {
        Cell { x, y }
    }
}

/// How a screen cell maps to a flat index on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Addressing {
    /// `x + y * W`.
    RowMajor,
    /// Physical strand order: the strand starts at the bottom row and runs
    /// back and forth, so odd strand rows run right to left.
    #[default]
    Serpentine,
}

impl Addressing {
    /// Flat index for `cell`. `None` when the cell lies outside `size`.
    pub fn to_index(self, size: GridSize, cell: Cell) -> Option<usize> {
        if !size.contains(cell) {
            return None;
        }
        let w = size.width as usize;
        let x = cell.x as usize;
        let index = match self {
            Addressing::RowMajor => x + cell.y as usize * w,
            Addressing::Serpentine => {
                let row = (size.height - 1 - cell.y) as usize;
                if row % 2 == 0 {
                    x + row * w
                } else {
                    (w - x) + row * w - 1
                }
            }
        };
        Some(index)
    }

    /// Inverse of [`to_index`](Self::to_index). `None` when `index` is out of range.
    pub fn from_index(self, size: GridSize, index: usize) -> Option<Cell> {
        if index >= size.len() {
            return None;
        }
        let w = size.width as usize;
        let (col, row) = (index % w, index / w);
        let cell = match self {
            Addressing::RowMajor => Cell::new(col as u32, row as u32),
            Addressing::Serpentine => {
                let x = if row % 2 == 0 { col } else { w - 1 - col };
                Cell::new(x as u32, size.height - 1 - row as u32)
            }
        };
        Some(cell)
    }
}

impl std::fmt::Display for Addressing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Addressing::RowMajor => write!(f, "row-major"),
            Addressing::Serpentine => write!(f, "serpentine"),
        }
    }
}

/// The painted state of every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    size: GridSize,
    cells: Vec<Option<ColorValue>>,
}

impl Grid {
    /// An empty grid.
    pub fn new(size: GridSize) -> Self {
        Grid {
            size,
            cells: vec![None; size.len()],
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// Overwrite one cell. Returns `false` (and changes nothing) outside the grid.
    pub fn set_cell(&mut self, cell: Cell, value: ColorValue) -> bool {
        let Some(i) = Addressing::RowMajor.to_index(self.size, cell) else {
            return false;
        };
        self.cells[i] = Some(value);
        true
    }

    pub fn get(&self, cell: Cell) -> Option<ColorValue> {
        let i = Addressing::RowMajor.to_index(self.size, cell)?;
        self.cells[i]
    }

    /// Non-empty cells in row-major order.
    pub fn painted(&self) -> impl Iterator<Item = (Cell, ColorValue)> + '_ {
        let w = self.size.width as usize;
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.map(|value| (Cell::new((i % w) as u32, (i / w) as u32), value))
        })
    }

    pub fn painted_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_clear(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}
