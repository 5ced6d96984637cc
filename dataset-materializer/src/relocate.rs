//! File relocation
//!
//! Moves a file into the dataset with standard move semantics: a rename when
//! source and destination share a filesystem, otherwise copy then delete.
//! A destination that exists before the move starts is never overwritten.
//! The rename path checks and then renames, so a destination created by
//! another process between those two steps can still be replaced; the copy
//! path uses `create_new` and has no such window.

use crate::error::MoveError;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// How a file reached its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMethod {
    Renamed,
    Copied,
}

/// Move `src` to `dest`, failing if `dest` already exists
///
/// Assumes nothing else writes into the destination directory during a run.
///
/// On failure the source is left where it was and no destination file is
/// left behind.
pub fn move_file(src: &Path, dest: &Path) -> Result<MoveMethod, MoveError> {
    // symlink_metadata so a dangling link still counts as taken
    if dest.symlink_metadata().is_ok() {
        return Err(MoveError::DestinationExists(dest.to_path_buf()));
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(MoveMethod::Renamed),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(MoveError::Io {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            source: e,
        }),
        Err(e) => {
            tracing::debug!(
                src = %src.display(),
                dest = %dest.display(),
                error = %e,
                "Rename failed, falling back to copy"
            );
            copy_then_remove(src, dest)
        }
    }
}

fn copy_then_remove(src: &Path, dest: &Path) -> Result<MoveMethod, MoveError> {
    let io_err = |source: io::Error| MoveError::Io {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source,
    };

    let mut input = File::open(src).map_err(io_err)?;
    let mut output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                MoveError::DestinationExists(dest.to_path_buf())
            } else {
                io_err(e)
            }
        })?;

    let copied = io::copy(&mut input, &mut output).and_then(|_| output.sync_all());
    drop(output);
    if let Err(e) = copied {
        let _ = fs::remove_file(dest);
        return Err(io_err(e));
    }

    if let Ok(metadata) = input.metadata() {
        let _ = fs::set_permissions(dest, metadata.permissions());
    }
    drop(input);

    if let Err(e) = fs::remove_file(src) {
        // Keep exactly one copy: the file stays at its source path
        let _ = fs::remove_file(dest);
        return Err(MoveError::SourceNotRemoved {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            source: e,
        });
    }

    Ok(MoveMethod::Copied)
}
