//! Zip archives of bundle directories.

use super::error::{Error, ErrorExt, Result};
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Zips the directory `source` into `output`.
///
/// Entries are stored under the directory's own name, so unpacking
/// `MyApp.app.dSYM.zip` recreates `MyApp.app.dSYM/`. Symlinks are stored as
/// links and Unix permissions are kept. The parent of `output` must exist.
/// On failure no partial archive is left at `output`.
pub async fn zip_directory(source: &Path, output: &Path) -> Result<()> {
    let source = source.to_path_buf();
    let output = output.to_path_buf();

    let written = tokio::task::spawn_blocking({
        let output = output.clone();
        move || write_zip(&source, &output)
    })
    .await
    .map_err(|e| Error::GenericError(format!("Zip task panicked: {}", e)))
    .and_then(|result| result);

    if written.is_err() {
        if let Err(e) = tokio::fs::remove_file(&output).await {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("Cannot remove partial archive {}: {}", output.display(), e);
            }
        }
    }
    written
}

fn write_zip(source: &Path, output: &Path) -> Result<()> {
    let root = source
        .file_name()
        .ok_or_else(|| Error::GenericError(format!("{} has no file name", source.display())))?;
    let root = PathBuf::from(root);

    let file = File::create(output).fs_context("creating archive", output)?;
    let mut zip = ZipWriter::new(file);
    let base_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source)?;
        let name = zip_entry_name(&root.join(relative));
        let options = with_permissions(base_options, &entry);

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path()).fs_context("reading symlink", entry.path())?;
            zip.add_symlink(name, target.to_string_lossy().into_owned(), options)?;
        } else if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input = File::open(entry.path()).fs_context("opening file for archiving", entry.path())?;
            io::copy(&mut input, &mut zip).fs_context("archiving file", entry.path())?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// Forward-slash separated entry name.
fn zip_entry_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn with_permissions(options: SimpleFileOptions, entry: &walkdir::DirEntry) -> SimpleFileOptions {
    use std::os::unix::fs::PermissionsExt;
    match entry.metadata() {
        Ok(metadata) => options.unix_permissions(metadata.permissions().mode()),
        Err(_) => options,
    }
}

#[cfg(not(unix))]
fn with_permissions(options: SimpleFileOptions, _entry: &walkdir::DirEntry) -> SimpleFileOptions {
    options
}
