//! Exported identity file.

use crate::pipeline::error::{ErrorExt, Result};
use std::{io::Write, path::Path};
use tempfile::NamedTempFile;

/// A PKCS#12 export of a signing identity written inside the workspace.
///
/// The file name is random (`identity*.p12`). It must be gone before
/// identity installation returns: call [`ExportedIdentity::remove`] and treat
/// its error as a failure. Dropping without `remove` still deletes the file,
/// which covers early returns and panics.
#[derive(Debug)]
pub struct ExportedIdentity {
    file: NamedTempFile,
}

impl ExportedIdentity {
    /// Writes `pkcs12` to a new file in `dir`.
    ///
    /// If writing fails the partially written file is removed before the
    /// error is returned.
    pub fn write_in(dir: &Path, pkcs12: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("identity")
            .suffix(".p12")
            .tempfile_in(dir)
            .fs_context("creating exported identity file in", dir)?;

        let path = file.path().to_path_buf();
        file.write_all(pkcs12)
            .and_then(|()| file.flush())
            .fs_context("writing exported identity", &path)?;

        Ok(Self { file })
    }

    /// Location of the file, for `security import`.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Deletes the file, reporting failure.
    pub fn remove(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close().fs_context("removing exported identity", &path)?;
        log::debug!("Removed exported identity {}", path.display());
        Ok(())
    }
}
