// SPDX-License-Identifier: MIT

//! The removable drive link inside the device map.

use std::io;
use std::path::Path;

use tracing::debug;

/// Replace whatever sits at `link` with a fresh symbolic link to `target`.
///
/// A dangling link is removed like any other entry; a directory is removed
/// with its contents.
pub(crate) fn replace_link(target: &Path, link: &Path) -> io::Result<()> {
    if let Some(parent) = link.parent() {
        fs_err::create_dir_all(parent)?;
    }
    match fs_err::symlink_metadata(link) {
        Ok(meta) if meta.is_dir() => {
            debug!("Removing directory at {}", link.display());
            fs_err::remove_dir_all(link)?;
        }
        Ok(_) => {
            debug!("Removing existing link at {}", link.display());
            fs_err::remove_file(link)?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    fs_err::os::unix::fs::symlink(target, link)
}
