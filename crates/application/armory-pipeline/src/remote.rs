use armory_core::Manifest;
use tracing::debug;

use crate::UpdateError;

/// Fetch and parse the update manifest document. Descriptor validation and
/// checksum lowercasing happen inside [`Manifest::from_json`], so the engine
/// only ever sees well-formed descriptors.
pub async fn fetch_manifest(client: &reqwest::Client, url: &str) -> Result<Manifest, UpdateError> {
    let url = url.trim();
    debug!("fetching manifest from {url}");

    let bytes = client
        .get(url)
        .send()
        .await
        .map_err(|e| UpdateError::Manifest(format!("manifest request failed: {e}")))?
        .error_for_status()
        .map_err(|e| UpdateError::Manifest(format!("manifest request failed: {e}")))?
        .bytes()
        .await
        .map_err(|e| UpdateError::Manifest(format!("manifest read failed: {e}")))?;

    Manifest::from_json(&bytes).map_err(|e| UpdateError::Manifest(e.to_string()))
}
