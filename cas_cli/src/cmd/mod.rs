mod commands;
mod export;
mod import;
mod init;
mod log;
mod ls;
mod mount;
mod util;

pub use commands::run_commands;
pub use export::run_export;
pub use import::run_import;
pub use init::run_init;
pub use log::run_log;
pub use ls::run_ls;
pub use mount::run_mount;

/// Whether a subcommand's run actually changed anything. `NoOp` maps to
/// exit code 1 (promoted to 0 by `--allow-noop`); `Success` always maps to
/// exit code 0. An `Err` return from any `run_*` function maps to 3.
pub enum Outcome {
    Success,
    NoOp,
}
