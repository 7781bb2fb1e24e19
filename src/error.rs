use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// External toolchain step that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Assemble,
    Link,
    Disassemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Compile => "compilation",
            Stage::Assemble => "assembly of the startup file",
            Stage::Link => "linking",
            Stage::Disassemble => "objdump",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A toolchain command could not be started or exited non-zero.
    #[error("{stage} failed for {}", .target.display())]
    Toolchain {
        stage: Stage,
        target: PathBuf,
        #[source]
        source: xshell::Error,
    },

    /// The file exists but is not an image we can locate sections in.
    #[error("couldn't parse the elf image {}: {reason}", .path.display())]
    MalformedImage { path: PathBuf, reason: String },

    #[error("couldn't {action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rendering or re-reading a hex dump failed.
    #[error("couldn't produce the {what}")]
    Dump {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error("unknown input file type: {} (expected .c, .elf or no extension)", .0.display())]
    UnknownInput(PathBuf),
}

impl Error {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Error::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(path: &Path, reason: impl fmt::Display) -> Self {
        Error::MalformedImage {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
