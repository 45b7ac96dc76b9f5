//! Packaged chart extraction

use crate::error::ChartDocError;
use crate::system::System;
use crate::utils::path::join_archive_member;
use anyhow::Result;
use flate2::read::GzDecoder;
use std::io::Read as _;
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::{debug, trace};

/// Extract a gzip-compressed tarball into `dest` through the system layer
///
/// Regular files and directories are written; links and other member types
/// are skipped. Returns the number of files written.
///
/// # Errors
///
/// Returns [`ChartDocError::ArchiveExtraction`] if the archive cannot be
/// opened or decoded, or a member would land outside `dest`
pub fn extract_archive(system: &dyn System, archive: &Path, dest: &Path) -> Result<usize> {
    let fail = |e: &dyn std::fmt::Display| {
        ChartDocError::archive_extraction(format!("{}: {e}", archive.display()))
    };

    let reader = system.open(archive).map_err(|e| fail(&e))?;
    let mut tarball = Archive::new(GzDecoder::new(reader));
    let mut written = 0;

    for entry in tarball.entries().map_err(|e| fail(&e))? {
        let mut entry = entry.map_err(|e| fail(&e))?;
        let member = entry.path().map_err(|e| fail(&e))?.into_owned();
        let target = join_archive_member(dest, &member)?;

        match entry.header().entry_type() {
            EntryType::Directory => {
                system.create_dir_all(&target).map_err(|e| fail(&e))?;
            }
            EntryType::Regular | EntryType::Continuous => {
                let mut contents = Vec::new();
                entry.read_to_end(&mut contents).map_err(|e| fail(&e))?;

                if let Some(parent) = target.parent() {
                    system.create_dir_all(parent).map_err(|e| fail(&e))?;
                }
                system.write(&target, &contents).map_err(|e| fail(&e))?;
                trace!("Extracted {}", target.display());
                written += 1;
            }
            other => debug!("Skipping archive member {} ({other:?})", member.display()),
        }
    }

    debug!("Extracted {written} files from {}", archive.display());
    Ok(written)
}
