use anyhow::Result;

use super::Outcome;

/// Prints the list of available subcommands, one per line — used by shell
/// completion scripts.
pub fn run_commands() -> Result<Outcome> {
    for name in ["init", "import", "export", "log", "ls", "mount", "commands"] {
        println!("{name}");
    }
    Ok(Outcome::Success)
}
