//! Source readers
//!
//! The aggregator only needs "path in, text or failure out". Anything that
//! can provide that implements [`SourceReader`], including plain closures.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Provides the text of a source file
pub trait SourceReader {
    fn read(&self, path: &Path) -> anyhow::Result<String>;
}

impl<F> SourceReader for F
where
    F: Fn(&Path) -> anyhow::Result<String>,
{
    fn read(&self, path: &Path) -> anyhow::Result<String> {
        self(path)
    }
}

/// Errors raised by [`FsReader`]
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },
}

/// Reads sources from the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> anyhow::Result<String> {
        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let text = String::from_utf8(bytes).map_err(|_| SourceError::InvalidUtf8 {
            path: path.to_path_buf(),
        })?;
        Ok(text)
    }
}
