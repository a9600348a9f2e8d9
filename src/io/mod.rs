//! Output writers for the frame and heat record streams.

pub mod export;
pub mod geojson;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::PipelineOutput;

/// Errors raised while writing output files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// A set of output files written to staging siblings and swapped in together.
///
/// Nothing under the target names changes until [`commit`](Self::commit).
/// Dropping an uncommitted batch removes its staging files.
#[derive(Debug, Default)]
pub struct StagedWrites {
    staged: Vec<(PathBuf, PathBuf)>,
    stale: Vec<PathBuf>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the content for `path` into its staging sibling.
    ///
    /// # Errors
    ///
    /// Returns the error from `write`, or an I/O error from creating or
    /// flushing the staging file, which is removed in that case.
    pub fn stage<F>(&mut self, path: &Path, write: F) -> Result<(), ExportError>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), ExportError>,
    {
        let staging = staging_path(path);
        if let Err(e) = write_staged(&staging, write) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        self.staged.push((staging, path.to_path_buf()));
        Ok(())
    }

    /// Marks `path` for removal once the staged files are in place.
    pub fn remove_on_commit(&mut self, path: PathBuf) {
        self.stale.push(path);
    }

    /// Renames every staged file into place, then removes stale files.
    ///
    /// # Errors
    ///
    /// Returns the first rename or removal failure. Staging files not yet
    /// renamed are removed.
    pub fn commit(mut self) -> Result<(), ExportError> {
        let staged = std::mem::take(&mut self.staged);
        let mut pending = staged.into_iter();
        while let Some((staging, target)) = pending.next() {
            if let Err(e) = fs::rename(&staging, &target) {
                let _ = fs::remove_file(&staging);
                for (rest, _) in pending {
                    let _ = fs::remove_file(rest);
                }
                return Err(e.into());
            }
        }
        for path in std::mem::take(&mut self.stale) {
            match fs::remove_file(&path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        Ok(())
    }
}

impl Drop for StagedWrites {
    fn drop(&mut self) {
        for (staging, _) in &self.staged {
            let _ = fs::remove_file(staging);
        }
    }
}

/// Writes `path` through a sibling staging file that is renamed into place
/// once `write` succeeds, so readers see either the old or the new content.
///
/// # Errors
///
/// Returns the error from `write`, or an I/O error from creating, flushing
/// or renaming the staging file. The staging file is removed on failure.
pub fn write_replacing<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), ExportError>,
{
    let mut batch = StagedWrites::new();
    batch.stage(path, write)?;
    batch.commit()
}

fn write_staged<F>(staging: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), ExportError>,
{
    let mut writer = BufWriter::new(File::create(staging)?);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Output locations requested for a run; `None` skips that output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportTargets<'a> {
    pub frames_csv: Option<&'a Path>,
    pub heat_csv: Option<&'a Path>,
    pub geojson_dir: Option<&'a Path>,
}

/// Writes every requested output of `output`, replacing prior files only
/// after all of them have been staged.
///
/// # Errors
///
/// Returns the first `ExportError`. Earlier outputs are left as they were
/// if any output fails to stage.
pub fn export_outputs(
    output: &PipelineOutput,
    targets: ExportTargets<'_>,
) -> Result<(), ExportError> {
    let mut batch = StagedWrites::new();
    if let Some(path) = targets.frames_csv {
        batch.stage(path, |w| export::write_frames_csv(&output.frames, w))?;
    }
    if let Some(path) = targets.heat_csv {
        batch.stage(path, |w| export::write_heat_csv(&output.heat, w))?;
    }
    if let Some(dir) = targets.geojson_dir {
        geojson::stage_geojson_dir(&output.frames, &output.heat, dir, &mut batch)?;
    }
    batch.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        fs::write(&path, "old").expect("seed file");

        write_replacing(&path, |w| Ok(w.write_all(b"new")?)).expect("write should succeed");
        assert_eq!(fs::read_to_string(&path).expect("read back"), "new");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn failed_write_leaves_previous_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        fs::write(&path, "old").expect("seed file");

        let result = write_replacing(&path, |w| {
            w.write_all(b"half")?;
            Err(io::Error::other("boom").into())
        });
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).expect("read back"), "old");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn batch_keeps_targets_until_commit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "old a").expect("seed a");

        let mut batch = StagedWrites::new();
        batch.stage(&a, |w| Ok(w.write_all(b"new a")?)).expect("stage a");
        batch.stage(&b, |w| Ok(w.write_all(b"new b")?)).expect("stage b");
        assert_eq!(fs::read_to_string(&a).expect("read a"), "old a");
        assert!(!b.exists());

        batch.commit().expect("commit");
        assert_eq!(fs::read_to_string(&a).expect("read a"), "new a");
        assert_eq!(fs::read_to_string(&b).expect("read b"), "new b");
    }

    #[test]
    fn failed_stage_discards_whole_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "old a").expect("seed a");

        let mut batch = StagedWrites::new();
        batch.stage(&a, |w| Ok(w.write_all(b"new a")?)).expect("stage a");
        let result = batch.stage(&b, |_| Err(io::Error::other("boom").into()));
        assert!(result.is_err());
        drop(batch);

        assert_eq!(fs::read_to_string(&a).expect("read a"), "old a");
        assert!(!staging_path(&a).exists());
        assert!(!staging_path(&b).exists());
    }

    #[test]
    fn commit_removes_stale_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stale = dir.path().join("old.txt");
        fs::write(&stale, "x").expect("seed");

        let mut batch = StagedWrites::new();
        batch.remove_on_commit(stale.clone());
        batch.remove_on_commit(dir.path().join("never-existed.txt"));
        batch.commit().expect("commit");
        assert!(!stale.exists());
    }
}
