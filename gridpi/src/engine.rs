use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    grid::{Action, Cell, Grid},
    GOAL_REWARD,
    STEP_REWARD,
};

/// Result of a call to [`Engine::evaluate`].
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Evaluation {
    pub sweeps: usize,
    pub delta: f64, // largest change in the last sweep
}

/// Policy iteration over a deterministic grid world.
///
/// The goal cell is terminal: its value and action are set at construction
/// and never touched again.
#[derive(Clone, Debug)]
pub struct Engine {
    grid: Grid,
    rewards: Box<[f64]>,
    policy: Box<[Action]>,
    values: Box<[f64]>,
}

impl Engine {
    /// Create an engine with a random initial policy drawn from `rng`.
    ///
    /// One action is drawn per non-goal cell, in row-major order.
    pub fn new(grid: Grid, rng: &mut impl Rng) -> Self {
        let goal = grid.index(grid.goal());
        let mut rewards = vec![STEP_REWARD; grid.cell_count()].into_boxed_slice();
        rewards[goal] = GOAL_REWARD;

        let policy = grid
            .cells()
            .map(|cell| {
                if grid.is_goal(cell) {
                    Action::Up
                } else {
                    rng.gen()
                }
            })
            .collect();

        let mut values = vec![0.0; grid.cell_count()].into_boxed_slice();
        values[goal] = rewards[goal];

        Self {
            grid,
            rewards,
            policy,
            values,
        }
    }

    /// Create an engine whose initial policy is reproducible from `seed`.
    #[must_use]
    pub fn with_seed(grid: Grid, seed: u64) -> Self {
        Self::new(grid, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn reward(&self, cell: Cell) -> f64 {
        self.rewards[self.grid.index(cell)]
    }

    #[must_use]
    pub fn value(&self, cell: Cell) -> f64 {
        self.values[self.grid.index(cell)]
    }

    #[must_use]
    pub fn action(&self, cell: Cell) -> Action {
        self.policy[self.grid.index(cell)]
    }

    /// Row-major policy table.
    #[must_use]
    pub const fn policy(&self) -> &[Action] {
        &self.policy
    }

    /// Row-major value table.
    #[must_use]
    pub const fn values(&self) -> &[f64] {
        &self.values
    }

    /// One-step Bellman backup: `r(s) + λ V(s')`.
    /// Rounded as a separate multiply and add, not a fused one.
    #[inline]
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn backup(&self, cell: Cell, action: Action) -> f64 {
        let next = self.grid.transition(cell, action);
        self.reward(cell) + self.grid.discount() * self.value(next)
    }

    /// Update every non-goal cell once under the current policy.
    /// Returns the largest absolute change.
    ///
    /// Values are updated in place in row-major order, so a cell may read
    /// successors that were already updated earlier in the same sweep.
    pub fn sweep(&mut self) -> f64 {
        let mut delta: f64 = 0.0;
        for cell in self.grid.cells() {
            if self.grid.is_goal(cell) {
                continue;
            }
            let index = self.grid.index(cell);
            let value = self.backup(cell, self.policy[index]);
            delta = delta.max((value - self.values[index]).abs());
            self.values[index] = value;
        }
        delta
    }

    /// Policy evaluation: up to `max_sweeps` sweeps, stopping early once
    /// a sweep changes no value by `tolerance` or more.
    pub fn evaluate(&mut self, tolerance: f64, max_sweeps: usize) -> Evaluation {
        let mut evaluation = Evaluation {
            sweeps: 0,
            delta: 0.0,
        };
        while evaluation.sweeps < max_sweeps {
            evaluation.delta = self.sweep();
            evaluation.sweeps += 1;
            if evaluation.delta < tolerance {
                break;
            }
        }
        evaluation
    }

    /// Greedy policy improvement. Returns how many cells changed action.
    ///
    /// Actions are tried in [`Action::ALL`] order and a later action only
    /// wins on strict improvement, so ties go to the earliest one.
    pub fn improve_count(&mut self) -> usize {
        let mut changed = 0;
        for cell in self.grid.cells() {
            if self.grid.is_goal(cell) {
                continue;
            }
            let index = self.grid.index(cell);
            let mut best = (self.policy[index], f64::NEG_INFINITY);
            for action in Action::ALL {
                let value = self.backup(cell, action);
                if value > best.1 {
                    best = (action, value);
                }
            }
            if best.0 != self.policy[index] {
                self.policy[index] = best.0;
                changed += 1;
            }
        }
        changed
    }

    /// Greedy policy improvement. Returns true if the policy is stable.
    pub fn improve(&mut self) -> bool {
        self.improve_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::Engine;
    use crate::{
        grid::{Action, Cell, Grid},
        GOAL_REWARD,
        STEP_REWARD,
    };

    const SEED: u64 = 1234;

    fn engine(rows: usize, cols: usize, goal: Cell) -> Engine {
        Engine::with_seed(Grid::new(rows, cols, goal, 0.9).unwrap(), SEED)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn initial_tables() {
        let goal = Cell::new(1, 3);
        let engine = engine(4, 5, goal);
        for cell in engine.grid().cells() {
            if cell == goal {
                assert_eq!(engine.reward(cell), GOAL_REWARD);
                assert_eq!(engine.value(cell), GOAL_REWARD);
                assert_eq!(engine.action(cell), Action::Up);
            } else {
                assert_eq!(engine.reward(cell), STEP_REWARD);
                assert_eq!(engine.value(cell), 0.0);
            }
        }
    }

    #[test]
    fn seed_reproduces_policy() {
        let grid = Grid::new(6, 6, Cell::new(2, 2), 0.9).unwrap();
        let a = Engine::with_seed(grid, SEED);
        let b = Engine::new(grid, &mut ChaCha8Rng::seed_from_u64(SEED));
        assert_eq!(a.policy(), b.policy());
    }

    #[test]
    fn random_policy_reaches_every_action() {
        let engine = engine(10, 10, Cell::new(1, 3));
        for action in Action::ALL {
            assert!(engine.policy().contains(&action), "{action:?} never drawn");
        }
    }

    #[test]
    fn goal_is_never_touched() {
        let goal = Cell::new(2, 1);
        let mut engine = engine(5, 5, goal);
        for _ in 0..20 {
            engine.evaluate(1e-4, 3);
            engine.improve();
            assert_eq!(engine.value(goal), GOAL_REWARD);
            assert_eq!(engine.action(goal), Action::Up);
            assert_eq!(engine.reward(goal), GOAL_REWARD);
        }
        assert!(engine
            .grid()
            .cells()
            .filter(|&cell| cell != goal)
            .all(|cell| engine.reward(cell) == STEP_REWARD));
    }

    #[test]
    fn sweep_reads_updated_values() {
        // Everything points left, towards the goal in column 0.
        let mut engine = engine(1, 3, Cell::new(0, 0));
        engine.policy.fill(Action::Left);
        engine.values.fill(0.0);
        engine.values[0] = GOAL_REWARD;
        engine.sweep();
        // Column 2 already sees the new value of column 1.
        assert!(close(engine.values[1], -0.1));
        assert!(close(engine.values[2], -1.09));
    }

    #[test]
    #[allow(clippy::float_cmp, clippy::suboptimal_flops)]
    fn backup_is_unfused() {
        let mut engine = engine(1, 3, Cell::new(0, 2));
        engine.policy.fill(Action::Right);
        for _ in 0..5 {
            engine.sweep();
        }
        let v1 = engine.values[1];
        assert_eq!(v1, STEP_REWARD + 0.9 * GOAL_REWARD);
        assert_eq!(engine.values[0], STEP_REWARD + 0.9 * v1);
        assert_eq!(
            engine.backup(Cell::new(0, 0), Action::Right),
            STEP_REWARD + 0.9 * v1
        );
    }

    #[test]
    fn evaluation_converges_under_fixed_policy() {
        let mut engine = engine(6, 7, Cell::new(3, 3));
        let mut last = f64::INFINITY;
        let mut sweeps = 0;
        while last >= 1e-8 {
            last = engine.sweep();
            sweeps += 1;
            assert!(sweeps < 1_000, "evaluation did not converge");
        }
        let evaluation = engine.evaluate(1e-8, 1_000);
        assert_eq!(evaluation.sweeps, 1);
        assert!(evaluation.delta < 1e-8);
    }

    #[test]
    fn evaluate_respects_max_sweeps() {
        let mut engine = engine(4, 4, Cell::new(0, 0));
        assert_eq!(engine.evaluate(1e-4, 0).sweeps, 0);
        assert_eq!(engine.evaluate(0.0, 3).sweeps, 3);
    }

    #[test]
    fn ties_go_to_first_action() {
        let mut engine = engine(3, 3, Cell::new(1, 1));
        engine.improve();
        // All successors are worth 0.0 except the goal.
        assert_eq!(engine.action(Cell::new(0, 0)), Action::Up);
        assert_eq!(engine.action(Cell::new(0, 2)), Action::Up);
        assert_eq!(engine.action(Cell::new(2, 0)), Action::Up);
        assert_eq!(engine.action(Cell::new(2, 2)), Action::Up);
        assert_eq!(engine.action(Cell::new(0, 1)), Action::Down);
        assert_eq!(engine.action(Cell::new(1, 0)), Action::Right);
        assert_eq!(engine.action(Cell::new(1, 2)), Action::Left);
        assert_eq!(engine.action(Cell::new(2, 1)), Action::Up);
    }

    #[test]
    fn improve_reports_changes() {
        let mut engine = engine(3, 3, Cell::new(1, 1));
        engine.policy.fill(Action::Up);
        // Only the three cells next to the goal that do not already point
        // at it have a strictly better action.
        assert_eq!(engine.improve_count(), 3);
        assert!(engine.improve());
    }

    #[test]
    fn stable_policy_is_greedy() {
        let mut engine = engine(5, 6, Cell::new(4, 0));
        let stable = (0..1_000).any(|_| {
            engine.evaluate(1e-4, 1);
            engine.improve()
        });
        assert!(stable, "policy did not stabilize");
        for cell in engine.grid().cells() {
            if engine.grid().is_goal(cell) {
                continue;
            }
            let chosen = engine.backup(cell, engine.action(cell));
            for action in Action::ALL {
                assert!(engine.backup(cell, action) <= chosen, "{cell} {action:?}");
            }
        }
    }

    #[test]
    fn single_cell_grid() {
        let goal = Cell::new(0, 0);
        let mut engine = engine(1, 1, goal);
        let evaluation = engine.evaluate(1e-4, 10);
        assert_eq!(evaluation.sweeps, 1);
        assert_eq!(evaluation.delta, 0.0);
        assert!(engine.improve());
        assert_eq!(engine.value(goal), GOAL_REWARD);
    }
}
