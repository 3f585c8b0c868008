//! Render and compile a sample two-column paper. Needs `latexmk` on PATH.
//!
//! ```text
//! cargo run --example paper -- /tmp/paper
//! ```

use solution_loop::tools::{Paper, current_year, generate_pdf};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const BODY: &str = r"\section{Introduction}
This is the introduction section of the paper.

\section{Methods}
This section describes the methods used in the research.

\section{Results}
Here are the results of our study.

\section{Discussion}
Discussion of the results and their implications.

\section{Conclusion}
Final conclusions and future work.";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("latex_template"));

    let paper = Paper::new(BODY)
        .title("Sample Research Paper")
        .authors(["John Doe", "Jane Smith"])
        .affiliations(["University A", "Research Institute B"])
        .keywords(["Research", "Science", "Technology"]);

    match generate_pdf(&dir, &paper, current_year()) {
        Ok(pdf) => println!("PDF generated at {}", pdf.display()),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
