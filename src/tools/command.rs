use std::path::Path;
use std::process::Command;

/// Captured result of an external program.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    /// Whether the program exited with status 0.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    /// Stderr and stdout joined, for error reports.
    pub fn diagnostics(&self) -> String {
        match (self.stderr.trim(), self.stdout.trim()) {
            ("", out) => out.to_string(),
            (err, "") => err.to_string(),
            (err, out) => format!("{err}\n{out}"),
        }
    }
}

/// Run `program` with `args` inside `dir`, without a shell.
///
/// A program that cannot be spawned (missing binary, missing directory) is
/// an `io::Error`; a non-zero exit is reported through `success`.
pub fn run_in_dir(dir: &Path, program: &str, args: &[&str]) -> std::io::Result<CmdOutput> {
    tracing::debug!(program, ?args, dir = %dir.display(), "running command");
    let output = Command::new(program).args(args).current_dir(dir).output()?;

    Ok(CmdOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
