//! Output writing functionality
//!
//! Reports go to stdout or a file; build output goes to a directory tree.

use crate::core::bundler::{BuildOutput, CHUNK_FINGERPRINT_EXCLUDE};
use crate::error::{AutoImportError, Result};
use crate::models::artifact::CHUNK_DIR;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Trait for output writers
pub trait OutputWriter {
    /// Write content to the output destination
    fn write(&self, content: &str) -> Result<()>;
}

/// Writer for stdout output
#[derive(Debug)]
pub struct StdoutWriter;

impl OutputWriter for StdoutWriter {
    fn write(&self, content: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| AutoImportError::StdoutWrite { source: e })
    }
}

/// Writer for file output
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
}

impl FileWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl OutputWriter for FileWriter {
    fn write(&self, content: &str) -> Result<()> {
        let mut file = File::create(&self.path).map_err(|e| AutoImportError::OutputWrite {
            path: self.path.clone(),
            source: e,
        })?;

        file.write_all(content.as_bytes())
            .map_err(|e| AutoImportError::OutputWrite {
                path: self.path.clone(),
                source: e,
            })
    }
}

/// Create an output writer based on the output file option
pub fn create_writer(output_file: Option<impl AsRef<Path>>) -> Box<dyn OutputWriter> {
    match output_file {
        Some(path) => Box::new(FileWriter::new(path)),
        None => Box::new(StdoutWriter),
    }
}

/// Write every file of the successful bundles under `dir`
///
/// Failed bundles contribute nothing, and whatever an earlier build left in
/// their entrypoint directory is removed. Chunks the output no longer lists are
/// pruned. Returns the written paths in order.
pub fn write_build_output(output: &BuildOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let files = output.files();

    for (bundle, _) in output.failures() {
        let stale = dir.join("entrypoints").join(bundle);
        if stale.is_dir() {
            fs::remove_dir_all(&stale).map_err(|e| AutoImportError::OutputWrite {
                path: stale.clone(),
                source: e,
            })?;
            debug!(bundle, path = %stale.display(), "removed output of failed bundle");
        }
    }

    let current: BTreeSet<PathBuf> = files.iter().map(|file| dir.join(&file.path)).collect();
    prune_chunks(dir, &current)?;

    let mut written = Vec::new();
    for file in files {
        let path = dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AutoImportError::OutputWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&path, &file.contents).map_err(|e| AutoImportError::OutputWrite {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), bytes = file.contents.len(), "wrote output file");
        written.push(path);
    }

    Ok(written)
}

/// Delete chunk files under `dir` that are not in `current`
fn prune_chunks(dir: &Path, current: &BTreeSet<PathBuf>) -> Result<()> {
    let chunk_dir = dir.join(CHUNK_DIR);
    if !chunk_dir.is_dir() {
        return Ok(());
    }

    let pattern = glob::Pattern::new(CHUNK_FINGERPRINT_EXCLUDE)?;
    let entries = fs::read_dir(&chunk_dir).map_err(|e| AutoImportError::OutputWrite {
        path: chunk_dir.clone(),
        source: e,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        let relative = format!("{}/{}", CHUNK_DIR, entry.file_name().to_string_lossy());
        if !pattern.matches(&relative) || current.contains(&path) {
            continue;
        }
        fs::remove_file(&path).map_err(|e| AutoImportError::OutputWrite {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), "pruned stale chunk");
    }
    Ok(())
}
