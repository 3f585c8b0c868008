//! Interactive code assistant: search, review, and follow-up questions.
//!
//! ```text
//! ANTHROPIC_API_KEY=... EXA_API_KEY=... cargo run --example assistant
//! ```

use solution_loop::tools::{ExaClient, read_file};
use solution_loop::{CodeAssistant, Config, Ctx, History};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> Option<String> {
    print!("{label}");
    io::stdout().flush().ok()?;
    lines.next()?.ok()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let ctx = Ctx::from_config(&config);

    let mut assistant = CodeAssistant::new();
    if let Some(key) = &config.exa_api_key {
        assistant = assistant.with_search(ExaClient::new(key.clone()));
    }
    let mut history = History::default();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("\n1. Search code");
        println!("2. Analyze code (path to a file)");
        println!("3. Ask a question");
        println!("4. Exit");

        let Some(choice) = prompt(&mut lines, "\nChoose an option (1-4): ") else {
            break;
        };

        match choice.trim() {
            "1" => {
                let Some(query) = prompt(&mut lines, "Search query: ") else {
                    break;
                };
                match assistant.search_code(query.trim()) {
                    Ok(hits) => {
                        for hit in hits {
                            println!("- {} <{}>", hit.title_or_default(), hit.url);
                        }
                    }
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "2" => {
                let Some(path) = prompt(&mut lines, "File: ") else {
                    break;
                };
                let analysis = read_file(path.trim())
                    .map_err(|e| e.to_string())
                    .and_then(|code| assistant.analyze(&ctx, &code).map_err(|e| e.to_string()));
                match analysis {
                    Ok(text) => println!("\n{text}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "3" => {
                let Some(question) = prompt(&mut lines, "Question: ") else {
                    break;
                };
                let context = prompt(&mut lines, "Context (optional): ").unwrap_or_default();
                match assistant.ask(&ctx, &mut history, question.trim(), context.trim()) {
                    Ok(answer) => println!("\n{answer}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "4" => break,
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
