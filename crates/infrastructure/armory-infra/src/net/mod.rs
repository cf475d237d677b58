use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use futures::StreamExt;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::checksum::Crc32;

type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>;

/// Shared HTTP client with a socket-level read timeout. The timeout bounds
/// each network read, not the transfer as a whole, so a stalled mirror is
/// abandoned while a slow-but-moving one is not.
pub fn default_http_client(read_timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().read_timeout(read_timeout).build()
}

/// One file to fetch: ordered mirror candidates and the staging location.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub id: u64,
    pub mirrors: Vec<String>,
    pub staging_path: Utf8PathBuf,
    pub expected_crc: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub id: u64,
    pub success: bool,
    pub bytes_downloaded: u64,
}

/// Why a single mirror attempt was discarded. Fallback to the next mirror
/// is driven by this result type rather than by error propagation.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("staging write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("crc32 is {computed}, but expected {expected}")]
    ChecksumMismatch { expected: String, computed: String },
}

/// Streams files from prioritized mirror lists, verifying checksums in
/// flight. Mirror attempts for one request are strictly sequential and
/// reuse the same staging file; callers that fetch many requests in
/// parallel must hand each request its own staging path.
pub struct MirrorDownloader {
    client: Client,
    limiter: Option<Limiter>,
}

impl MirrorDownloader {
    pub fn new(client: Client, rate_limit_bytes: Option<u64>) -> Self {
        let limiter = rate_limit_bytes.and_then(|bps| {
            NonZeroU32::new(bps as u32)
                .map(|nz| Arc::new(RateLimiter::direct(Quota::per_second(nz))))
        });
        Self { client, limiter }
    }

    /// Try each mirror in order; the first verified download wins. Exhausting
    /// every mirror is a per-request failure, reported in the result rather
    /// than raised, so sibling fetches are unaffected.
    pub async fn fetch(&self, req: &FetchRequest) -> FetchResult {
        let mut bytes_downloaded = 0u64;

        for url in &req.mirrors {
            match self
                .attempt(
                    url,
                    &req.staging_path,
                    req.expected_crc.as_deref(),
                    &mut bytes_downloaded,
                )
                .await
            {
                Ok(()) => {
                    debug!("download successful for {url}");
                    return FetchResult {
                        id: req.id,
                        success: true,
                        bytes_downloaded,
                    };
                }
                Err(e) => {
                    warn!("mirror {url} discarded: {e}");
                }
            }
        }

        error!("all mirrors failed for {:?}", req.mirrors);
        FetchResult {
            id: req.id,
            success: false,
            bytes_downloaded,
        }
    }

    /// One streaming GET: bytes go to the staging file and through the CRC32
    /// accumulator at the same time, so no second read pass is needed.
    async fn attempt(
        &self,
        url: &str,
        staging_path: &Utf8Path,
        expected_crc: Option<&str>,
        bytes_downloaded: &mut u64,
    ) -> Result<(), AttemptError> {
        let resp = self.client.get(url).send().await?.error_for_status()?;

        // Truncates any partial write left by a previous mirror.
        let mut file = File::create(staging_path.as_std_path()).await?;
        let mut crc = Crc32::new();
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(l) = &self.limiter {
                if let Some(nz) = NonZeroU32::new(chunk.len() as u32) {
                    l.until_n_ready(nz).await.ok();
                }
            }
            crc.update(&chunk);
            file.write_all(&chunk).await?;
            *bytes_downloaded += chunk.len() as u64;
        }
        file.flush().await?;

        let computed = crc.finish();
        if let Some(expected) = expected_crc {
            if expected != computed {
                return Err(AttemptError::ChecksumMismatch {
                    expected: expected.to_string(),
                    computed,
                });
            }
        }
        Ok(())
    }
}
