pub mod complete;
pub mod init;
pub mod integrate;
pub mod module;
pub mod next;
pub mod plan;
pub mod status;

use anyhow::Context;
use std::path::Path;
use vibecraft_core::manifest::Manifest;

/// Load the manifest or fail with a hint to run `vibecraft init`.
pub(crate) fn load_manifest(root: &Path) -> anyhow::Result<Manifest> {
    Manifest::load(root).with_context(|| format!("no vibecraft project at {}", root.display()))
}

pub(crate) fn ensure_initialized(root: &Path) -> anyhow::Result<()> {
    load_manifest(root).map(|_| ())
}
