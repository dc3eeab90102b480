use clap::Parser;
use gridpi::{
    engine::Engine,
    grid::{Cell, Grid},
    iteration::{Outcome, PolicyIteration},
    DEFAULT_DISCOUNT,
    DEFAULT_SWEEPS,
    DEFAULT_TOLERANCE,
};
use rand::Rng;

#[derive(Parser, Debug)]
struct Args {
    /// Number of rows in the grid
    #[arg(long, default_value_t = 10)]
    rows: usize,
    /// Number of columns in the grid
    #[arg(long, default_value_t = 10)]
    cols: usize,
    /// Goal cell as `row,col`
    #[arg(long, default_value_t = Cell::new(1, 3))]
    goal: Cell,
    /// Discount factor, strictly between 0 and 1
    #[arg(long, default_value_t = DEFAULT_DISCOUNT)]
    discount: f64,
    /// Stop evaluating once a sweep changes no value by this much
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,
    /// Maximum evaluation sweeps per iteration
    #[arg(long, default_value_t = DEFAULT_SWEEPS)]
    sweeps: usize,
    /// Seed for the initial policy (random if not given, printed either way)
    #[arg(long)]
    seed: Option<u64>,
    /// Give up after this many iterations
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Only print the final tables
    #[arg(long)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let grid = match Grid::new(args.rows, args.cols, args.goal, args.discount) {
        Ok(grid) => grid,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };
    let seed: u64 = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::info!("seed: {seed}");

    let engine = Engine::with_seed(grid, seed);
    print!("{}", header(seed, &engine));

    let mut iteration = PolicyIteration::new(engine, args.tolerance, args.sweeps);
    let outcome = iteration.run(args.max_iterations, |iteration| {
        if !args.quiet {
            print_tables(iteration);
        }
    });
    if args.quiet {
        print_tables(&iteration);
    }

    match outcome {
        Outcome::Converged { iterations } => {
            println!("Optimal policy found after {iterations} iterations.");
        }
        Outcome::Capped { iterations } => {
            println!("No stable policy after {iterations} iterations.");
        }
    }
}

/// Seed and initial policy, enough to reproduce the run with `--seed`.
fn header(seed: u64, engine: &Engine) -> String {
    format!("Seed: {seed}\nPolicy:\n{}\n", engine.policy_display())
}

fn print_tables(iteration: &PolicyIteration) {
    let engine = iteration.engine();
    println!("Iteration {}:", iteration.iterations());
    println!("Policy:\n{}", engine.policy_display());
    println!("State Values:\n{}", engine.value_display());
}
