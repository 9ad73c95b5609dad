//! Preparation of the output directory the walkthroughs write to.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// What [`prepare_workspace`] did to the directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkspaceReport {
    /// The directory did not exist and was created.
    pub created: bool,
    /// Absolute paths of the files removed from an existing directory, sorted.
    pub deleted: Vec<PathBuf>,
}

/// Makes sure `dir` exists and holds no files.
///
/// A missing directory is created with all of its parents. In an existing
/// directory every direct file is deleted; subdirectories are left alone.
/// Running it twice in a row gives an empty directory both times.
///
/// Paths in the notices and in the report are absolute, resolved against the
/// working directory without following symlinks.
///
/// # Errors
///
/// Any I/O failure while creating, listing or deleting is returned as is.
pub fn prepare_workspace(dir: &Path) -> io::Result<WorkspaceReport> {
    let dir = std::path::absolute(dir)?;

    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        info!("Directory '{}' created successfully.", dir.display());
        return Ok(WorkspaceReport {
            created: true,
            deleted: Vec::new(),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            files.push(dir.join(entry.file_name()));
        }
    }
    files.sort();

    for file in &files {
        fs::remove_file(file)?;
        info!("File deleted: {}", file.display());
    }
    info!("Directory '{}' cleaned up.", dir.display());

    Ok(WorkspaceReport {
        created: false,
        deleted: files,
    })
}
