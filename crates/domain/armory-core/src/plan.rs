use std::collections::HashSet;

use camino::Utf8Path;

use crate::{FileDescriptor, Manifest};

/// Disjoint routing of manifest entries for one update run.
///
/// `verified` is empty at plan time; the orchestrator fills it after the
/// local-check phase and promotes mismatching entries into `pending_fetch`.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationPlan {
    pub verified: Vec<FileDescriptor>,
    pub pending_local_check: Vec<FileDescriptor>,
    pub pending_fetch: Vec<FileDescriptor>,
    pub skipped: Vec<FileDescriptor>,
}

/// Classify every manifest entry against the local install tree.
///
/// A descriptor with a checksum and an existing target is checked before it
/// is ever fetched. The ignore set only suppresses the unconditional
/// fetch-when-missing rule: an ignored file that exists locally with a
/// checksum still lands in `pending_local_check`, so a failed integrity
/// check can still repair it.
pub fn plan(
    manifest: &Manifest,
    install_root: &Utf8Path,
    ignore: &HashSet<String>,
) -> ReconciliationPlan {
    let mut out = ReconciliationPlan::default();

    for desc in &manifest.files {
        if desc.crc.is_some() && desc.target_path(install_root).exists() {
            out.pending_local_check.push(desc.clone());
        } else if !ignore.contains(desc.file_name()) {
            out.pending_fetch.push(desc.clone());
        } else {
            out.skipped.push(desc.clone());
        }
    }

    out
}
