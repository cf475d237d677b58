use std::collections::HashSet;

use anyhow::{Context, Result};
use armory_infra::checksum::checksum_file;
use armory_pipeline::{default_engine, fetch_manifest, UpdateConfig, UpdateOutcome};
use camino::Utf8PathBuf;
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};

use crate::progress::BarProgress;

fn ignore_set(keep: Option<Vec<String>>) -> HashSet<String> {
    match keep {
        Some(names) => names.into_iter().collect(),
        None => armory_config::DEFAULT_IGNORE_ON_UPDATE
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

fn build_client() -> Result<reqwest::Client> {
    armory_infra::net::default_http_client(armory_config::SOCKET_READ_TIMEOUT)
        .context("Failed to build HTTP client")
}

pub async fn cmd_check(
    manifest_url: String,
    path: Utf8PathBuf,
    keep: Option<Vec<String>>,
) -> Result<()> {
    println!(":: Checking for updates...");
    println!("   Manifest: {}", manifest_url);
    println!("   Install:  {}", path);

    let client = build_client()?;
    let manifest = fetch_manifest(&client, &manifest_url).await?;
    let plan = armory_core::plan(&manifest, &path, &ignore_set(keep));

    let pb = ProgressBar::new(plan.pending_local_check.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:30} [{bar:40.green}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message("calculating local crc32");

    let mut verified = 0usize;
    let mut stale = 0usize;
    for desc in &plan.pending_local_check {
        let target = desc.target_path(&path);
        let computed = tokio::task::spawn_blocking(move || checksum_file(&target)).await?;
        match computed {
            Ok(crc) if desc.crc.as_deref() == Some(crc.as_str()) => verified += 1,
            _ => stale += 1,
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let pending = plan.pending_fetch.len() + stale;
    println!("\n:: Update Check Result");
    println!("   Missing or unverifiable: {}", plan.pending_fetch.len());
    println!("   Stale local files:       {}", stale);
    println!("   Verified local files:    {}", verified);
    println!("   Skipped (user files):    {}", plan.skipped.len());
    if pending == 0 {
        println!("   Status:                  Up to date");
    } else {
        println!("   Status:                  Updates available (run `update`)");
    }

    Ok(())
}

pub async fn cmd_update(
    manifest_url: String,
    path: Utf8PathBuf,
    keep: Option<Vec<String>>,
    threads: usize,
    limit_mb: Option<u64>,
) -> Result<()> {
    println!(":: Updating...");
    println!("   Manifest: {}", manifest_url);
    println!("   Install:  {}", path);

    let client = build_client()?;
    let manifest = fetch_manifest(&client, &manifest_url).await?;

    let mut config = UpdateConfig::new(path);
    config.ignore_on_update = ignore_set(keep);
    config.download_threads = armory_config::clamp_threads(threads);
    config.rate_limit_bytes = limit_mb.map(|mb| mb * 1024 * 1024);

    let engine = default_engine(client, config);
    let progress = BarProgress::new();
    let outcome = engine.run(&manifest, &progress).await;
    progress.finish();

    match outcome? {
        UpdateOutcome::UpToDate => println!("\n:: Everything is up to date"),
        UpdateOutcome::Updated => println!("\n:: Update complete"),
        UpdateOutcome::Failed { name } => {
            anyhow::bail!("update failed on {name}; check the log and try again")
        }
    }

    Ok(())
}

pub async fn cmd_hash(file: Utf8PathBuf) -> Result<()> {
    let size = std::fs::metadata(file.as_std_path())
        .with_context(|| format!("cannot stat {file}"))?
        .len();
    let display = file.clone();
    let crc = tokio::task::spawn_blocking(move || checksum_file(&file)).await??;
    println!("{crc}  {display} ({})", format_size(size, DECIMAL));
    Ok(())
}
