//! Run the full loop against Anthropic.
//!
//! ```text
//! ANTHROPIC_API_KEY=... cargo run --example refine -- \
//!     "reduce battery drain" "poll the sensor every 1ms"
//! ```

use solution_loop::{Config, Ctx, Problem, RetryPolicy, Solution, SolutionLoop};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let problem = args
        .next()
        .unwrap_or_else(|| "Reduce battery drain of a wearable step counter".to_string());
    let known_bad = args
        .next()
        .unwrap_or_else(|| "Poll the accelerometer every millisecond".to_string());

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let mut ctx = Ctx::from_config(&config);

    let result = SolutionLoop::from_config(Problem::new(problem), Solution::new(known_bad), &config)
        .parallel_evaluation(true)
        .retry(RetryPolicy::new(2, Duration::from_secs(1)))
        .run(&mut ctx);

    println!("=== Log ===");
    for entry in ctx.logs() {
        println!("  {entry}");
    }

    match result {
        Ok(report) => {
            for (round, set) in report.ledger.rounds().iter().enumerate() {
                println!("\n=== Round {round} ===");
                for c in set {
                    println!("  [{:>2}] {}", c.reward, c.solution);
                }
            }
            println!("\n=== Best (reward {}) ===", report.best.reward);
            println!("{}", report.best.solution);
        }
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(best) = e.best_so_far {
                eprintln!("best so far (reward {}): {}", best.reward, best.solution);
            }
            std::process::exit(1);
        }
    }
}
