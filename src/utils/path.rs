//! Path manipulation and validation utilities

use crate::error::ChartDocError;
use anyhow::Result;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components lexically
///
/// Leading `..` components that cannot be resolved are kept.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Join an archive member path onto an extraction directory
///
/// # Errors
///
/// Returns [`ChartDocError::ArchiveExtraction`] when the member is absolute
/// or resolves outside `dest`
pub fn join_archive_member(dest: &Path, member: &Path) -> Result<PathBuf> {
    if member.has_root() || matches!(member.components().next(), Some(Component::Prefix(_))) {
        return Err(ChartDocError::archive_extraction(format!(
            "Archive member has an absolute path: '{}'",
            member.display()
        ))
        .into());
    }

    let normalized = normalize_path(member);
    if matches!(normalized.components().next(), Some(Component::ParentDir)) {
        return Err(ChartDocError::archive_extraction(format!(
            "Archive member escapes the extraction directory: '{}'",
            member.display()
        ))
        .into());
    }

    Ok(dest.join(normalized))
}
