// SPDX-License-Identifier: MIT

//! Listing of the public desktop folder, for file-browser presentations.

use std::cmp::Ordering;
use std::io;
use std::path::PathBuf;

use tracing::warn;

use super::layout::SandboxRoot;

/// One entry of the desktop folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

/// List the public desktop folder of the sandbox.
///
/// Hidden entries (leading `.`) are skipped.  Directories come first, then
/// entries are ordered by case-insensitive name.  A missing desktop folder is
/// an empty listing, not an error.
pub fn desktop_entries(root: &SandboxRoot) -> io::Result<Vec<DesktopEntry>> {
    let desktop = root.desktop();
    let dir = match fs_err::read_dir(&desktop) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            warn!("Failed to read desktop folder: {err}");
            return Err(err);
        }
    };

    let mut entries = Vec::new();
    for entry in dir {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        // Follow links, so a link to a folder sorts with the folders.
        let is_dir = entry.path().is_dir();
        entries.push(DesktopEntry {
            path: entry.path(),
            name,
            is_dir,
        });
    }
    entries.sort_by(compare_entries);
    Ok(entries)
}

fn compare_entries(a: &DesktopEntry, b: &DesktopEntry) -> Ordering {
    b.is_dir
        .cmp(&a.is_dir)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}
