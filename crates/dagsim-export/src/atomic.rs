use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::{ExportError, Result};

/// Stream an encoding into a sibling temp file, then rename it over `path`.
///
/// `encode` returns the number of bytes it produced. Readers of `path` see
/// either the previous contents or the complete new file; on failure the
/// temp file is removed and `path` is left untouched.
pub fn write_atomic<F>(path: &Path, encode: F) -> Result<u64>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<u64>,
{
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;

    let mut writer = BufWriter::new(file);
    let written = match encode(&mut writer).and_then(|bytes| finish(writer).map(|()| bytes)) {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err);
        }
    };

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }

    Ok(written)
}

/// Atomically replace `path` with `data`.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<u64> {
    write_atomic(path, |writer| {
        writer.write_all(data)?;
        Ok(data.len() as u64)
    })
}

fn finish(writer: BufWriter<File>) -> Result<()> {
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ExportError::InvalidLocation(path.display().to_string()))?;
    Ok(path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy())))
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_encoding_leaves_no_file_behind() {
        let dir = std::env::temp_dir().join(format!("dagsim_atomic_{}", std::process::id()));
        let path = dir.join("table.csv");

        let result = write_atomic(&path, |_| Err(ExportError::UnknownFormat("x".to_string())));
        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!dir.join(".table.csv.tmp").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
