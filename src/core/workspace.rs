//! Workspace seeding from steering-file templates

use crate::core::error::ChainError;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Copy every steering template (`*.txt`, non-recursive) from `template_dir`
/// into `work_dir`, overwriting stale copies left by earlier runs.
///
/// File contents, permission bits and modification times are carried over,
/// so a re-seeded workspace is indistinguishable from a fresh one. Returns
/// the number of files copied; an empty template directory seeds nothing and
/// is not an error.
pub fn seed_workspace(template_dir: &Path, work_dir: &Path) -> Result<usize, ChainError> {
    let entries = fs::read_dir(template_dir).map_err(|source| ChainError::Seed {
        path: template_dir.to_path_buf(),
        source,
    })?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry.map_err(|source| ChainError::Seed {
            path: template_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
            continue;
        }
        let file_name = match path.file_name() {
            Some(name) => name,
            None => continue,
        };

        let dest = work_dir.join(file_name);
        copy_preserving(&path, &dest).map_err(|source| ChainError::Seed {
            path: path.clone(),
            source,
        })?;
        debug!("seeded {}", dest.display());
        copied += 1;
    }

    info!(
        "seeded {} steering file(s) into {}",
        copied,
        work_dir.display()
    );
    Ok(copied)
}

// fs::copy carries the permission bits; the modification time is carried
// separately and only best-effort, as some filesystems refuse to set it.
fn copy_preserving(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    let metadata = fs::metadata(from)?;
    if let Ok(mtime) = metadata.modified() {
        let dest = File::options().write(true).open(to)?;
        let _ = dest.set_modified(mtime);
    }
    Ok(())
}
