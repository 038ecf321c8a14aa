//! Temporary payload files handed to the child process.
//!
//! Each payload is written to a uniquely named file, flushed to stable
//! storage, and removed when the [`TempArtifact`] is dropped. Dropping
//! happens on every exit path of an invocation, including unwinding.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::InvokeError;

/// Which payload a file carries. Determines the file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Keys,
    Data,
    Script,
}

impl PayloadKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Keys => "tempKeys",
            Self::Data => "tempData",
            Self::Script => "tempScript",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Keys => "keys",
            Self::Data => "data",
            Self::Script => "script",
        }
    }
}

/// A payload file that lives exactly as long as this value.
#[derive(Debug)]
pub struct TempArtifact {
    kind: PayloadKind,
    file: NamedTempFile,
}

impl TempArtifact {
    /// Write `contents` to a fresh file in `dir` (or the OS temp dir).
    pub fn create(
        kind: PayloadKind,
        contents: &str,
        dir: Option<&Path>,
    ) -> Result<Self, InvokeError> {
        let wrap = |source| InvokeError::TempFile {
            payload: kind.name(),
            source,
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(kind.prefix());
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(wrap)?;

        file.write_all(contents.as_bytes()).map_err(wrap)?;
        file.as_file().sync_all().map_err(wrap)?;

        Ok(Self { kind, file })
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
