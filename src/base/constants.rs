//! Constants shared by the loader, the store and the filesystem watch.

/// Extension of model description files.
pub const MODEL_FILE_EXTENSION: &str = "tmd";

/// Quiescence window applied to filesystem events, per path.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default model root when none is configured.
pub const DEFAULT_MODEL_ROOT: &str = ".";
