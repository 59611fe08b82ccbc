//! # Board Module
//!
//! Coordinates, cells and the per-player grid.
//!
//! ## Layout
//!
//! - Coordinates are 0-indexed; `(0, 0)` is the top-left cell
//! - Cells are stored in row-major order (`y * width + x`)
//! - Valid coordinates satisfy `0 <= x < width` and `0 <= y < height`
//!
//! ## Ownership
//!
//! A [`Board`] belongs to exactly one player. Occupancy is written only by
//! the owning [`Player`](crate::player::Player) together with the ship's own
//! coordinate list, so the two never disagree. The opposing side reads the
//! board through [`Board::view`], which applies fog of war.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::ShipId;

/// A cell position. Immutable value type.
///
/// Components are signed so that callers can express positions off the
/// board; [`Board::contains`] decides validity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The coordinate `steps` cells away along `orientation`, or `None` past
    /// the `i32` range.
    #[must_use]
    pub fn step(self, orientation: Orientation, steps: i32) -> Option<Self> {
        match orientation {
            Orientation::Horizontal => self.x.checked_add(steps).map(|x| Self::new(x, self.y)),
            Orientation::Vertical => self.y.checked_add(steps).map(|y| Self::new(self.x, y)),
        }
    }

    /// Chebyshev (king-move) distance.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Whether the two coordinates touch, diagonals included.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self != other && self.distance(other) == 1
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction a ship extends from its origin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Extends towards increasing `x`.
    Horizontal,
    /// Extends towards increasing `y`.
    Vertical,
}

bitflags! {
    /// Marks recorded on a cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CellMarks: u8 {
        /// The cell was attacked.
        const HIT = 1 << 0;
        /// The cell's content is visible to the opponent.
        const REVEALED = 1 << 1;
    }
}

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Position of this cell.
    pub coordinate: Coordinate,
    /// Ship occupying the cell, if any.
    pub occupant: Option<ShipId>,
    /// Hit and reveal marks.
    pub marks: CellMarks,
}

impl Cell {
    fn empty(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            occupant: None,
            marks: CellMarks::empty(),
        }
    }

    /// Whether a ship occupies the cell.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Whether the cell was attacked.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        self.marks.contains(CellMarks::HIT)
    }

    /// Whether the cell is visible to the opponent.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.marks.contains(CellMarks::REVEALED)
    }
}

/// What an observer sees in a cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CellView {
    /// Hidden by fog of war.
    Unknown,
    /// Open water, not attacked.
    Water,
    /// A ship, not attacked.
    Ship {
        /// The occupying ship.
        ship: ShipId,
    },
    /// Attacked open water.
    Miss,
    /// Attacked ship cell.
    Hit {
        /// The occupying ship.
        ship: ShipId,
    },
}

/// A rendered board, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    /// Columns.
    pub width: u8,
    /// Rows.
    pub height: u8,
    /// Cells in row-major order.
    pub cells: Vec<CellView>,
}

impl BoardView {
    /// The view of one cell, if in bounds.
    #[must_use]
    pub fn at(&self, coordinate: Coordinate) -> Option<CellView> {
        let x = usize::try_from(coordinate.x).ok()?;
        let y = usize::try_from(coordinate.y).ok()?;
        let width = usize::from(self.width);
        if x >= width || y >= usize::from(self.height) {
            return None;
        }
        self.cells.get(y * width + x).copied()
    }
}

/// A player's grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: u8,
    height: u8,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty `width` x `height` board.
    #[must_use]
    pub fn new(width: u8, height: u8) -> Self {
        let mut cells = Vec::with_capacity(usize::from(width) * usize::from(height));
        for y in 0..i32::from(height) {
            for x in 0..i32::from(width) {
                cells.push(Cell::empty(Coordinate::new(x, y)));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Columns.
    #[must_use]
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Rows.
    #[must_use]
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Whether `coordinate` lies on the board.
    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.index(coordinate).is_some()
    }

    fn index(&self, coordinate: Coordinate) -> Option<usize> {
        let x = usize::try_from(coordinate.x).ok()?;
        let y = usize::try_from(coordinate.y).ok()?;
        let width = usize::from(self.width);
        if x >= width || y >= usize::from(self.height) {
            return None;
        }
        Some(y * width + x)
    }

    /// The cell at `coordinate`, if in bounds.
    #[must_use]
    pub fn cell(&self, coordinate: Coordinate) -> Option<&Cell> {
        self.index(coordinate).map(|idx| &self.cells[idx])
    }

    fn cell_mut(&mut self, coordinate: Coordinate) -> Option<&mut Cell> {
        self.index(coordinate).map(move |idx| &mut self.cells[idx])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    /// Ship occupying `coordinate`.
    #[must_use]
    pub fn occupant(&self, coordinate: Coordinate) -> Option<ShipId> {
        self.cell(coordinate).and_then(|cell| cell.occupant)
    }

    /// Whether `coordinate` was already attacked. False off the board.
    #[must_use]
    pub fn is_hit(&self, coordinate: Coordinate) -> bool {
        self.cell(coordinate).is_some_and(Cell::is_hit)
    }

    /// The cells a ship of `size` would cover from `origin`, or `None` if any
    /// of them falls off the board.
    #[must_use]
    pub fn footprint(
        &self,
        origin: Coordinate,
        orientation: Orientation,
        size: u8,
    ) -> Option<Vec<Coordinate>> {
        let cells: Vec<Coordinate> = (0..i32::from(size))
            .map(|step| origin.step(orientation, step))
            .collect::<Option<_>>()?;
        cells.iter().all(|c| self.contains(*c)).then_some(cells)
    }

    /// In-bounds coordinates within `radius` (Chebyshev) of `center`, row-major.
    #[must_use]
    pub fn area(&self, center: Coordinate, radius: u8) -> Vec<Coordinate> {
        let r = i32::from(radius);
        let mut out = Vec::new();
        for y in center.y.saturating_sub(r)..=center.y.saturating_add(r) {
            for x in center.x.saturating_sub(r)..=center.x.saturating_add(r) {
                let coordinate = Coordinate::new(x, y);
                if self.contains(coordinate) {
                    out.push(coordinate);
                }
            }
        }
        out
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_occupied()).count()
    }

    /// Number of attacked cells.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_hit()).count()
    }

    /// Writes `ship` into every listed cell. Callers validate first.
    pub(crate) fn occupy(&mut self, coordinates: &[Coordinate], ship: ShipId) {
        for coordinate in coordinates {
            if let Some(cell) = self.cell_mut(*coordinate) {
                cell.occupant = Some(ship);
            }
        }
    }

    /// Clears occupancy of every listed cell.
    pub(crate) fn vacate(&mut self, coordinates: &[Coordinate]) {
        for coordinate in coordinates {
            if let Some(cell) = self.cell_mut(*coordinate) {
                cell.occupant = None;
            }
        }
    }

    /// Marks a cell as attacked (and revealed). Returns false if it already was.
    pub(crate) fn mark_hit(&mut self, coordinate: Coordinate) -> bool {
        match self.cell_mut(coordinate) {
            Some(cell) if !cell.is_hit() => {
                cell.marks.insert(CellMarks::HIT | CellMarks::REVEALED);
                true
            }
            _ => false,
        }
    }

    /// Reveals a cell to the opponent. Returns true if it was hidden.
    pub(crate) fn reveal(&mut self, coordinate: Coordinate) -> bool {
        match self.cell_mut(coordinate) {
            Some(cell) if !cell.is_revealed() => {
                cell.marks.insert(CellMarks::REVEALED);
                true
            }
            _ => false,
        }
    }

    /// What an observer sees at `coordinate`.
    ///
    /// With `fog` set, unrevealed cells read as [`CellView::Unknown`].
    #[must_use]
    pub fn query(&self, coordinate: Coordinate, fog: bool) -> Option<CellView> {
        self.cell(coordinate).map(|cell| Self::render(cell, fog))
    }

    /// The whole board as an observer sees it.
    #[must_use]
    pub fn view(&self, fog: bool) -> BoardView {
        BoardView {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(|cell| Self::render(cell, fog)).collect(),
        }
    }

    fn render(cell: &Cell, fog: bool) -> CellView {
        if fog && !cell.is_revealed() {
            return CellView::Unknown;
        }
        match (cell.occupant, cell.is_hit()) {
            (None, false) => CellView::Water,
            (None, true) => CellView::Miss,
            (Some(ship), false) => CellView::Ship { ship },
            (Some(ship), true) => CellView::Hit { ship },
        }
    }
}
