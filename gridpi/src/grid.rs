use std::{fmt, num::ParseIntError, str::FromStr};

use ordered_float::{FloatIsNan, NotNan};
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};
use thiserror::Error;

/// A state of the grid, 0-indexed from the top left corner.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

#[derive(Debug, Error)]
pub enum ParseCellError {
    #[error("expected `row,col`")]
    MissingComma,
    #[error("cell coordinate parse error: {0}")]
    Coordinate(#[from] ParseIntError),
}

impl FromStr for Cell {
    type Err = ParseCellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s.trim().split_once(',').ok_or(ParseCellError::MissingComma)?;
        Ok(Self {
            row: row.trim().parse()?,
            col: col.trim().parse()?,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// Every action, in the order improvement scans them.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Up => '^',
            Self::Down => 'v',
            Self::Left => '<',
            Self::Right => '>',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

impl Distribution<Action> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        Action::ALL[rng.gen_range(0..Action::ALL.len())]
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid needs at least one row and one column, got {rows}x{cols}")]
    Empty { rows: usize, cols: usize },
    #[error("goal {goal} lies outside the {rows}x{cols} grid")]
    GoalOutOfBounds { goal: Cell, rows: usize, cols: usize },
    #[error("discount factor is NaN: {0}")]
    DiscountNan(#[from] FloatIsNan),
    #[error("discount factor {0} is not in (0, 1)")]
    DiscountOutOfRange(f64),
}

/// Dimensions, terminal goal and discount of a deterministic grid world.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Grid {
    rows: usize,
    cols: usize,
    goal: Cell,
    discount: f64,
}

impl Grid {
    /// Validate and build a grid.
    ///
    /// # Errors
    ///
    /// Fails if the grid is empty, the goal is outside of it,
    /// or the discount is not strictly between 0 and 1.
    pub fn new(rows: usize, cols: usize, goal: Cell, discount: f64) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty { rows, cols });
        }
        if goal.row >= rows || goal.col >= cols {
            return Err(GridError::GoalOutOfBounds { goal, rows, cols });
        }
        let discount = NotNan::new(discount)?.into_inner();
        if discount <= 0.0 || discount >= 1.0 {
            return Err(GridError::DiscountOutOfRange(discount));
        }
        Ok(Self {
            rows,
            cols,
            goal,
            discount,
        })
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub const fn goal(&self) -> Cell {
        self.goal
    }

    #[must_use]
    pub const fn discount(&self) -> f64 {
        self.discount
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    #[must_use]
    pub fn is_goal(&self, cell: Cell) -> bool {
        cell == self.goal
    }

    /// Row-major index of a cell into the grid's tables.
    #[inline]
    #[must_use]
    pub const fn index(&self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }

    /// All cells in row-major ascending order.
    /// Evaluation depends on this order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Cell { row, col }))
    }

    /// Successor of `cell` under `action`. Moving into a wall stays put.
    #[must_use]
    pub fn transition(&self, cell: Cell, action: Action) -> Cell {
        match action {
            Action::Up => Cell {
                row: cell.row.saturating_sub(1),
                ..cell
            },
            Action::Down => Cell {
                row: (cell.row + 1).min(self.rows - 1),
                ..cell
            },
            Action::Left => Cell {
                col: cell.col.saturating_sub(1),
                ..cell
            },
            Action::Right => Cell {
                col: (cell.col + 1).min(self.cols - 1),
                ..cell
            },
        }
    }
}
