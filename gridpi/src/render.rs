use std::fmt;

use crate::engine::Engine;

const GOAL_GLYPH: char = 'G';

/// Policy table, one glyph per cell.
pub struct PolicyDisplay<'a>(&'a Engine);

/// Value table, fixed width with two decimals per cell.
pub struct ValueDisplay<'a>(&'a Engine);

impl Engine {
    #[must_use]
    pub const fn policy_display(&self) -> PolicyDisplay<'_> {
        PolicyDisplay(self)
    }

    #[must_use]
    pub const fn value_display(&self) -> ValueDisplay<'_> {
        ValueDisplay(self)
    }
}

impl fmt::Display for PolicyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.0.grid();
        for cell in grid.cells() {
            let glyph = if grid.is_goal(cell) {
                GOAL_GLYPH
            } else {
                self.0.action(cell).glyph()
            };
            write!(f, " {glyph} ")?;
            if cell.col + 1 == grid.cols() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.0.grid();
        for cell in grid.cells() {
            write!(f, "{:6.2} ", self.0.value(cell))?;
            if cell.col + 1 == grid.cols() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
