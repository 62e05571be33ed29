//! Reference implementations of the two external collaborators `cas_fs`'s
//! spec treats as outside the core: a filesystem **scanner** that imports a
//! real directory tree into a [`cas_fs::CasFs`], and an **extractor** that
//! writes a resolved virtual subtree back out to a real filesystem.
//!
//! Neither is part of the directory-tree core; they exist so the core is
//! independently demonstrable and round-trip testable end to end, and so
//! `cas_cli`'s `import`/`export` subcommands have something to call.

mod device;
mod error;
mod extract;
mod scan;

pub use error::{Error, Result};
pub use extract::extract_dir;
pub use scan::scan_dir;
