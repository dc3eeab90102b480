use crate::engine::Engine;

/// Where the policy iteration loop currently is.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Initialized,
    Evaluating,
    Improving,
    Converged,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Converged { iterations: usize },
    Capped { iterations: usize },
}

impl Outcome {
    #[must_use]
    pub const fn iterations(&self) -> usize {
        match self {
            Self::Converged { iterations } | Self::Capped { iterations } => *iterations,
        }
    }

    #[must_use]
    pub const fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Alternates evaluation and improvement until the policy is stable.
pub struct PolicyIteration {
    engine: Engine,
    phase: Phase,
    iterations: usize,
    tolerance: f64,
    max_sweeps: usize,
}

impl PolicyIteration {
    #[must_use]
    pub const fn new(engine: Engine, tolerance: f64, max_sweeps: usize) -> Self {
        Self {
            engine,
            phase: Phase::Initialized,
            iterations: 0,
            tolerance,
            max_sweeps,
        }
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn into_engine(self) -> Engine {
        self.engine
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed evaluate + improve pairs.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Do the work of the current phase and move to the next one.
    pub fn step(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::Initialized => Phase::Evaluating,
            Phase::Evaluating => {
                let evaluation = self.engine.evaluate(self.tolerance, self.max_sweeps);
                log::trace!(
                    "evaluated with {} sweeps, delta = {:.6}",
                    evaluation.sweeps,
                    evaluation.delta
                );
                Phase::Improving
            }
            Phase::Improving => {
                let changed = self.engine.improve_count();
                self.iterations += 1;
                log::debug!("iteration {}: {changed} actions changed", self.iterations);
                if changed == 0 {
                    Phase::Converged
                } else {
                    Phase::Evaluating
                }
            }
            Phase::Converged => Phase::Converged,
        };
        self.phase
    }

    /// Run one evaluate + improve pair. Returns true if the policy is stable.
    /// A pending improvement left by [`PolicyIteration::step`] is completed
    /// without evaluating again.
    pub fn iterate(&mut self) -> bool {
        match self.phase {
            Phase::Converged => return true,
            Phase::Improving => {}
            Phase::Initialized | Phase::Evaluating => {
                while self.step() != Phase::Improving {}
            }
        }
        self.step() == Phase::Converged
    }

    /// Iterate until the policy is stable or `max_iterations` is reached.
    /// `observer` is called after every iteration.
    ///
    /// Without a cap this does not return if the policy never stabilizes.
    pub fn run(
        &mut self,
        max_iterations: Option<usize>,
        mut observer: impl FnMut(&Self),
    ) -> Outcome {
        while self.phase != Phase::Converged {
            if max_iterations.is_some_and(|max| self.iterations >= max) {
                log::warn!("stopped after {} iterations without converging", self.iterations);
                return Outcome::Capped {
                    iterations: self.iterations,
                };
            }
            self.iterate();
            observer(self);
        }
        log::info!("policy stable after {} iterations", self.iterations);
        Outcome::Converged {
            iterations: self.iterations,
        }
    }
}
