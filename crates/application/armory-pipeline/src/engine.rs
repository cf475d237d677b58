use armory_core::plan::ReconciliationPlan;
use armory_core::{path_utils, FileDescriptor, Manifest};
use armory_infra::checksum::checksum_file;
use armory_infra::net::{FetchRequest, FetchResult, MirrorDownloader};
use camino::Utf8PathBuf;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::{ProgressReporter, UpdateConfig, UpdateError, UpdateOutcome};

const STAGING_PREFIX: &str = ".armory-staging-";

/// Seam between the orchestrator and the network. The production
/// implementation is [`MirrorDownloader`]; tests substitute stubs.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> FetchResult;
}

#[async_trait::async_trait]
impl Fetcher for MirrorDownloader {
    async fn fetch(&self, req: &FetchRequest) -> FetchResult {
        MirrorDownloader::fetch(self, req).await
    }
}

/// Drives one full update cycle: plan, verify local files, fetch stale
/// descriptors into a run-scoped staging directory, then commit each staged
/// file into the install tree with an atomic rename.
pub struct UpdateEngine {
    fetcher: Box<dyn Fetcher>,
    config: UpdateConfig,
}

impl UpdateEngine {
    pub fn new(client: reqwest::Client, config: UpdateConfig) -> Self {
        let downloader = MirrorDownloader::new(client, config.rate_limit_bytes);
        Self {
            fetcher: Box::new(downloader),
            config,
        }
    }

    pub fn with_fetcher(fetcher: Box<dyn Fetcher>, config: UpdateConfig) -> Self {
        Self { fetcher, config }
    }

    /// Run the cycle to completion. Mirror exhaustion for any one descriptor
    /// aborts the run before anything is committed and surfaces as
    /// [`UpdateOutcome::Failed`]; the caller may simply retry later.
    pub async fn run(
        &self,
        manifest: &Manifest,
        progress: &dyn ProgressReporter,
    ) -> Result<UpdateOutcome, UpdateError> {
        for desc in &manifest.files {
            if !path_utils::verify_safe(&desc.name) {
                return Err(UpdateError::Manifest(format!(
                    "unsafe path in manifest: {}",
                    desc.name
                )));
            }
        }

        let mut plan = armory_core::plan(
            manifest,
            &self.config.install_root,
            &self.config.ignore_on_update,
        );
        self.verify_local(&mut plan, progress).await?;

        if plan.pending_fetch.is_empty() {
            info!("everything is up to date");
            return Ok(UpdateOutcome::UpToDate);
        }

        // Staging lives inside the install root so the commit rename never
        // crosses a filesystem boundary.
        tokio::fs::create_dir_all(self.config.install_root.as_std_path())
            .await
            .map_err(|e| UpdateError::Filesystem {
                path: self.config.install_root.clone(),
                source: e,
            })?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(self.config.install_root.as_std_path())
            .map_err(|e| UpdateError::Filesystem {
                path: self.config.install_root.clone(),
                source: e,
            })?;
        let staging_root = Utf8PathBuf::from_path_buf(staging.path().to_path_buf())
            .map_err(|p| UpdateError::Task(format!("staging path is not UTF-8: {}", p.display())))?;

        let requests: Vec<(FileDescriptor, FetchRequest)> = plan
            .pending_fetch
            .iter()
            .enumerate()
            .map(|(i, desc)| {
                let req = FetchRequest {
                    id: i as u64,
                    mirrors: desc.mirrors.clone(),
                    staging_path: staging_root.join(desc.file_name()),
                    expected_crc: desc.crc.clone(),
                };
                (desc.clone(), req)
            })
            .collect();

        progress.begin_phase("downloading remote files", requests.len() as u64);
        if let Some(name) = self.fetch_all(&requests, progress).await {
            error!("update failed on {name}");
            return Ok(UpdateOutcome::Failed { name });
        }

        progress.begin_phase("replacing old files", requests.len() as u64);
        for (desc, req) in &requests {
            let target = desc.target_path(&self.config.install_root);
            crate::io_utils::replace_file(&req.staging_path, &target)
                .await
                .map_err(|e| UpdateError::Filesystem {
                    path: target.clone(),
                    source: e,
                })?;
            progress.advance(1);
        }

        info!("update complete, {} files replaced", requests.len());
        // Dropping `staging` here, and on every earlier exit, removes the
        // temporary directory and anything still inside it.
        Ok(UpdateOutcome::Updated)
    }

    /// Hash every pending-check target and route it to `verified` or
    /// `pending_fetch`. An unreadable file is treated like a mismatch.
    async fn verify_local(
        &self,
        plan: &mut ReconciliationPlan,
        progress: &dyn ProgressReporter,
    ) -> Result<(), UpdateError> {
        if plan.pending_local_check.is_empty() {
            return Ok(());
        }

        progress.begin_phase(
            "calculating local crc32",
            plan.pending_local_check.len() as u64,
        );

        for desc in std::mem::take(&mut plan.pending_local_check) {
            let target = desc.target_path(&self.config.install_root);
            debug!("calculating crc32 for {target}");

            let computed = tokio::task::spawn_blocking({
                let target = target.clone();
                move || checksum_file(&target)
            })
            .await
            .map_err(|e| UpdateError::Task(e.to_string()))?;

            match computed {
                Ok(crc) if desc.crc.as_deref() == Some(crc.as_str()) => plan.verified.push(desc),
                Ok(crc) => {
                    debug!(
                        "crc32 for {target} is {crc}, but expected {}",
                        desc.crc.as_deref().unwrap_or("?")
                    );
                    plan.pending_fetch.push(desc);
                }
                Err(e) => {
                    warn!("could not hash {target}: {e}; scheduling fetch");
                    plan.pending_fetch.push(desc);
                }
            }
            progress.advance(1);
        }

        Ok(())
    }

    /// Fetch every request, bounded by the configured thread count. Returns
    /// the name of the first descriptor to exhaust its mirrors, or `None`
    /// when everything landed in staging. Dropping the stream on first
    /// failure cancels in-flight sibling fetches.
    async fn fetch_all(
        &self,
        requests: &[(FileDescriptor, FetchRequest)],
        progress: &dyn ProgressReporter,
    ) -> Option<String> {
        let fetcher = &*self.fetcher;
        let concurrency = self.config.download_threads.max(1);

        let mut results = futures::stream::iter(
            requests
                .iter()
                .map(|(desc, req)| async move { (desc, fetcher.fetch(req).await) }),
        )
        .buffer_unordered(concurrency);

        while let Some((desc, result)) = results.next().await {
            if !result.success {
                return Some(desc.name.clone());
            }
            progress.advance(1);
        }
        None
    }
}
