// SPDX-License-Identifier: MIT

//! The static `system.reg` configuration written at the sandbox root.
//!
//! The content is fixed: shell-folder mappings for the public profile and one
//! autorun policy.  No registry parsing happens anywhere in this crate.

use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

/// Literal content of `system.reg`.
pub const SYSTEM_REG_CONTENT: &str = r#"WINE REGISTRY Version 2
;; All keys relative to \Machine\Software\Microsoft\Windows\CurrentVersion

[Software\Microsoft\Windows\CurrentVersion\Explorer\Shell Folders]
"Common Desktop"="C:\users\Public\Desktop"
"Common Documents"="C:\users\Public\Documents"
"Common Programs"="C:\users\ProgramData"
"Common Start Menu"="C:\ProgramData\Microsoft\Windows\Start Menu"
"Common Startup"="C:\ProgramData\Microsoft\Windows\Start Menu\Programs\Startup"
"Common Templates"="C:\ProgramData\Microsoft\Windows\Templates"
"Desktop"="C:\users\Public\Desktop"
"Favorites"="C:\users\Public\Favorites"
"Personal"="C:\users\Public\Documents"
"Programs"="C:\users\Public\Start Menu\Programs"
"Start Menu"="C:\users\Public\Start Menu"
"Startup"="C:\users\Public\Start Menu\Programs\Startup"
"Templates"="C:\users\Public\Templates"

[Software\Microsoft\Windows\CurrentVersion\Policies\Explorer]
"NoDriveTypeAutoRun"=dword:00000091
"#;

/// Write `data` to `path` atomically using a temporary file in the same
/// directory and a rename.
pub(crate) fn write_atomic(path: &Path, data: &str) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        )
    })?;
    let mut temp_file = NamedTempFile::new_in(parent)?;
    io::Write::write_all(&mut temp_file, data.as_bytes())?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|err| {
        io::Error::new(
            err.error.kind(),
            format!(
                "Failed to persist temporary file to {}: {}",
                path.display(),
                err.error
            ),
        )
    })?;
    Ok(())
}
