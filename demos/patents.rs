//! Look up expired patents in a category.
//!
//! ```text
//! EXA_API_KEY=... cargo run --example patents -- "inventions using magnets" 5
//! ```

use solution_loop::tools::{ExaClient, search_patents};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Ok(key) = std::env::var("EXA_API_KEY") else {
        eprintln!("EXA_API_KEY is not set");
        std::process::exit(1);
    };

    let mut args = std::env::args().skip(1);
    let category = args.next().unwrap_or_else(|| "inventions using AI".to_string());
    let n = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);

    match search_patents(&ExaClient::new(key), &category, n) {
        Ok(patents) if patents.is_empty() => println!("no patents found for '{category}'"),
        Ok(patents) => match serde_json::to_string_pretty(&patents) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("error: {e}"),
        },
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
