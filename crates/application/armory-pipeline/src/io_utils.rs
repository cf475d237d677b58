use std::time::Duration;

use camino::Utf8Path;

/// Move a staged file over its final target. Missing parent directories are
/// created first; the rename itself is atomic on a single filesystem, so an
/// observer sees either the old file or the complete new one. Retries with
/// backoff absorb transient locks on the target (antivirus, the game itself).
pub async fn replace_file(from: &Utf8Path, to: &Utf8Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent.as_std_path()).await?;
    }

    let mut attempt = 0u32;
    let max_attempts = 8u32;
    let mut backoff = Duration::from_millis(50);

    loop {
        match tokio::fs::rename(from.as_std_path(), to.as_std_path()).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(e);
                }
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, Duration::from_millis(2000));
            }
        }
    }
}
