use crate::entry::Metadata;

/// How missing directories along a path should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MkdirMode {
    /// Missing components are an error.
    #[default]
    Off,
    /// Missing directories are fabricated and persisted to the overlay.
    FabricateMissing,
    /// Like `FabricateMissing`, and additionally a non-directory entry
    /// encountered mid-path is replaced with a fabricated directory rather
    /// than failing with `NotADirectory`.
    FabricateAndOverwrite,
}

/// Flags controlling [`crate::CasFs::resolve_path`] and friends.
#[derive(Debug, Clone)]
pub struct PathFlags {
    pub follow_symlinks: bool,
    /// Fabricate ephemeral placeholder entries for missing trailing
    /// components instead of failing. Never persisted to the overlay.
    pub partial: bool,
    pub mkdir: MkdirMode,
    /// Suppress errors encountered mid-resolution, returning whatever
    /// prefix of the path was successfully resolved instead of `Err`.
    pub no_die: bool,
    /// Forces strict (non-fabricating, non-`no_die`) behavior for this
    /// call even if `partial`/`mkdir`/`no_die` are set — used by callers
    /// that need one strict lookup without constructing a second flag set.
    pub error_out: bool,
    pub mkdir_defaults: Metadata,
}

impl Default for PathFlags {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
            partial: false,
            mkdir: MkdirMode::Off,
            no_die: false,
            error_out: false,
            mkdir_defaults: Metadata::default(),
        }
    }
}

impl PathFlags {
    pub fn strict() -> Self {
        Self {
            error_out: true,
            ..Self::default()
        }
    }

    pub fn mkdir(mode: MkdirMode) -> Self {
        Self {
            mkdir: mode,
            ..Self::default()
        }
    }

    pub(crate) fn effective_partial(&self) -> bool {
        self.partial && !self.error_out
    }

    pub(crate) fn effective_mkdir(&self) -> MkdirMode {
        if self.error_out {
            MkdirMode::Off
        } else {
            self.mkdir
        }
    }

    pub(crate) fn effective_no_die(&self) -> bool {
        self.no_die && !self.error_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_out_suppresses_mkdir_partial_and_no_die() {
        let flags = PathFlags {
            partial: true,
            mkdir: MkdirMode::FabricateMissing,
            no_die: true,
            error_out: true,
            ..PathFlags::default()
        };
        assert_eq!(flags.effective_mkdir(), MkdirMode::Off);
        assert!(!flags.effective_partial());
        assert!(!flags.effective_no_die());
    }

    #[test]
    fn strict_sets_error_out_over_defaults() {
        let flags = PathFlags::strict();
        assert!(flags.error_out);
        assert_eq!(flags.effective_mkdir(), MkdirMode::Off);
    }

    #[test]
    fn mkdir_helper_sets_requested_mode_without_error_out() {
        let flags = PathFlags::mkdir(MkdirMode::FabricateAndOverwrite);
        assert_eq!(flags.effective_mkdir(), MkdirMode::FabricateAndOverwrite);
        assert!(!flags.error_out);
    }
}
