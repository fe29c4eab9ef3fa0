//! Packaging of call graph output

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("zip failed: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Zip, encode and clean up job output files
pub trait Archiver: Send + Sync {
    /// Store `source` in a new zip at `target` under `entry_name`
    fn zip_file(&self, source: &Path, target: &Path, entry_name: &str) -> Result<(), ArchiveError>;

    /// Write the base64 encoding of `source` to `target`
    fn b64(&self, source: &Path, target: &Path) -> Result<(), ArchiveError>;

    /// Remove `path`; a file that is already gone is not an error
    fn cleanup(&self, path: &Path) -> Result<(), ArchiveError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn zip_file(&self, source: &Path, target: &Path, entry_name: &str) -> Result<(), ArchiveError> {
        let content = std::fs::read(source)?;
        let mut writer = ZipWriter::new(File::create(target)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        writer.start_file(entry_name, options)?;
        writer.write_all(&content)?;
        writer.finish()?;
        Ok(())
    }

    fn b64(&self, source: &Path, target: &Path) -> Result<(), ArchiveError> {
        let content = std::fs::read(source)?;
        std::fs::write(target, STANDARD.encode(content))?;
        Ok(())
    }

    fn cleanup(&self, path: &Path) -> Result<(), ArchiveError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
