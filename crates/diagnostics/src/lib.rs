//! Shared logging setup for the bucketfs workspace.
//!
//! Every crate logs through the same `emit` pipeline, configured once from
//! the environment:
//!
//! - `BUCKETFS_LOG=off` (default) - silent
//! - `BUCKETFS_LOG=error|warn|info|debug` - minimum level written to stderr

use std::sync::Once;

// Re-exported so the macros below resolve in downstream crates.
pub use emit;

static INIT: Once = Once::new();

fn parse_level(name: &str) -> Option<emit::Level> {
    match name {
        "error" => Some(emit::Level::Error),
        "warn" => Some(emit::Level::Warn),
        "info" => Some(emit::Level::Info),
        "debug" => Some(emit::Level::Debug),
        _ => None,
    }
}

/// Initialize logging from the BUCKETFS_LOG environment variable.
///
/// Safe to call any number of times; only the first call takes effect.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let setting = std::env::var("BUCKETFS_LOG").unwrap_or_else(|_| "off".to_string());
        if setting == "off" {
            return;
        }

        let level = match parse_level(&setting) {
            Some(level) => level,
            None => {
                eprintln!("Unknown BUCKETFS_LOG value '{setting}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime must outlive the process; there is no shutdown hook.
        std::mem::forget(rt);
    });
}

pub use init_diagnostics as init;

/// Log routine operations (listings, uploads, folder changes).
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log fine-grained internals (cache hits, page counts, key rewrites).
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable trouble (retries, fallbacks, ignored cleanup failures).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that abort the current operation.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}
