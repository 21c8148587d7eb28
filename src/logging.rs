//! Coded diagnostics over the `log` facade.
//!
//! Every user-visible line carries a numeric message code (`[I500]`, `[E8]`,
//! ...) so that CI jobs can grep for specific conditions without parsing
//! free-form text.

use env_logger::Env;

/// Message codes attached to log lines.
///
/// Codes below 100 are configuration and per-file failures, 100 is reserved
/// for git, and the 500 range is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgCode {
    Debug = 0,
    BadComponentName = 1,
    BadMaxBlameAuthors = 2,
    BadTargetPaths = 3,
    BadStaticConfigPath = 4,
    BadStaticConfigFormat = 5,
    FileOrDirDoesNotExist = 6,
    FileReadWriteError = 7,
    BadHeaderFormat = 8,
    RunningExternalToolError = 9,
    InternalError = 10,
    GitError = 100,

    ProcessingFile = 500,
    HeaderFound = 501,
    HeaderNotFound = 502,
    PossibleAuthors = 503,
    WouldUpdateCopyrightNotice = 504,
    UpdatedCopyrightNotice = 505,
}

impl MsgCode {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Initialize the global logger.
///
/// `--verbose` lowers the default filter to `debug`; `RUST_LOG` still wins
/// when set, following `env_logger` conventions.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Info-level line with a message code prefix.
#[macro_export]
macro_rules! info_code {
    ($code:expr, $($arg:tt)+) => {
        log::info!("[I{}] {}", $crate::logging::MsgCode::code($code), format_args!($($arg)+))
    };
}

/// Warning-level line with a message code prefix.
#[macro_export]
macro_rules! warn_code {
    ($code:expr, $($arg:tt)+) => {
        log::warn!("[W{}] {}", $crate::logging::MsgCode::code($code), format_args!($($arg)+))
    };
}

/// Error-level line with a message code prefix.
#[macro_export]
macro_rules! err_code {
    ($code:expr, $($arg:tt)+) => {
        log::error!("[E{}] {}", $crate::logging::MsgCode::code($code), format_args!($($arg)+))
    };
}
