//! Run path resolution
//!
//! A calibration run is anchored on the directory holding the reconstructed
//! tracks. The working directory and the published output file both live one
//! level above it, next to the other numbered stages of the campaign:
//!
//! ```text
//! <campaign>/
//!   1reco/                upstream reconstruction (provides inputforalign.txt)
//!   2track/               input directory passed on the command line
//!   3millepede/           working directory, created here
//!   inputforalign.txt     published result
//! ```

use crate::core::error::ChainError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the working directory created next to the input directory
pub const WORK_DIR_NAME: &str = "3millepede";

/// Name of the published alignment constants file
pub const OUTPUT_FILE_NAME: &str = "inputforalign.txt";

/// Filesystem context for one chain run, all paths absolute
#[derive(Debug, Clone)]
pub struct RunPaths {
    /// Canonicalized input directory (reconstructed tracks)
    pub input_dir: PathBuf,

    /// Working directory the steps execute in
    pub work_dir: PathBuf,

    /// Final destination of the aggregated alignment constants
    pub output_path: PathBuf,
}

impl RunPaths {
    /// Resolve the working directory and output path from the input path.
    ///
    /// The input must already exist; whether a file or a directory is usable
    /// is the converter's contract, not checked here. Symlinks are resolved
    /// before deriving the siblings. The working directory is created if
    /// absent, so re-running against the same input reuses it. The output
    /// path is only computed, never created.
    pub fn resolve(input_dir: &Path) -> Result<Self, ChainError> {
        if !input_dir.exists() {
            return Err(ChainError::InputNotFound {
                path: input_dir.to_path_buf(),
            });
        }

        let input_dir = fs::canonicalize(input_dir)?;
        let parent = input_dir.parent().unwrap_or_else(|| Path::new("/"));

        let work_dir = parent.join(WORK_DIR_NAME);
        fs::create_dir_all(&work_dir)?;
        let work_dir = fs::canonicalize(&work_dir)?;

        let output_path = parent.join(OUTPUT_FILE_NAME);

        debug!(
            "resolved workspace {} and output {}",
            work_dir.display(),
            output_path.display()
        );

        Ok(Self {
            input_dir,
            work_dir,
            output_path,
        })
    }
}

/// Resolve a step-relative path against the working directory.
///
/// Absolute paths pass through untouched. Relative paths, including the
/// `../1reco` reach into the sibling stage, stay unnormalized so they mean
/// exactly what they would to a process running inside `work_dir`.
pub fn resolve_in(work_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}
