//! Central configuration constants for runtime limits and defaults.

use std::time::Duration;

/// Socket-level read timeout for mirror downloads. Applies per network read,
/// not to the whole run.
pub const SOCKET_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Filenames an update never creates when they are absent locally. The
/// user-edited loot filter is the canonical member.
pub const DEFAULT_IGNORE_ON_UPDATE: &[&str] = &["item.filter"];

/// Default number of concurrent file downloads.
pub const DEFAULT_DOWNLOAD_THREADS: usize = 4;

/// Minimum allowed concurrent file downloads.
pub const MIN_DOWNLOAD_THREADS: usize = 1;

/// Maximum allowed concurrent file downloads.
pub const MAX_DOWNLOAD_THREADS: usize = 8;

/// Convenience function to clamp a thread value into allowed range.
pub fn clamp_threads(v: usize) -> usize {
    v.clamp(MIN_DOWNLOAD_THREADS, MAX_DOWNLOAD_THREADS)
}
