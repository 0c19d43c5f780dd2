//! §4.L: the sidecar metadata file. Carries exactly one boolean
//! (`encrypted`) alongside the stego JPEG, under the same basename with a
//! `.meta` extension.
//!
//! spec.md's design notes call out that the original implementation reaches
//! for a general-purpose object-graph serializer for this single flag, and
//! explicitly ask that we not carry that dependency over: a one-line
//! `key=value` text file says everything a single bool needs to say.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// A single boolean flag: whether the payload this sidecar describes was
/// encrypted before embedding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SidecarMetadata {
    pub encrypted: bool,
}

impl SidecarMetadata {
    /// `<stego-basename>.meta`, next to the stego image at `stego_path`.
    pub fn path_for(stego_path: &Path) -> PathBuf {
        stego_path.with_extension("meta")
    }

    /// Write `encrypted=true` or `encrypted=false` to the sidecar path.
    pub fn write(&self, stego_path: &Path) -> Result<()> {
        let path = Self::path_for(stego_path);
        std::fs::write(&path, format!("encrypted={}\n", self.encrypted))?;
        log::debug!("wrote sidecar {:?}: encrypted={}", path, self.encrypted);
        Ok(())
    }

    /// Read the sidecar next to `stego_path`. A missing file is not an
    /// error: it means `encrypted=false` (spec.md §4.J).
    pub fn read(stego_path: &Path) -> Result<Self> {
        let path = Self::path_for(stego_path);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("no sidecar at {:?}, defaulting to encrypted=false", path);
                return Ok(SidecarMetadata::default());
            }
            Err(err) => return Err(err.into()),
        };

        let encrypted = contents
            .lines()
            .find_map(|line| line.strip_prefix("encrypted="))
            .map(|value| value.trim() == "true")
            .unwrap_or(false);
        Ok(SidecarMetadata { encrypted })
    }
}
