//! Storage layer: log file reading, directory discovery, processed-directory
//! bookkeeping and YAML config I/O.

use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::error;

use crate::error::{MineError, Result};

// ─── Log files ───────────────────────────────────────────────────────────────

/// Read a whole log file as UTF-8 text.
pub fn read_logfile(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            error!(file = %path.display(), "File not found");
            MineError::FileNotFound(path.to_path_buf())
        }
        ErrorKind::PermissionDenied => MineError::PermissionDenied(path.to_path_buf()),
        _ => MineError::Io(e),
    })
}

/// Files directly inside `dir` whose name starts with `prefix`, sorted.
pub fn list_log_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(prefix) {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Every directory under `root` (root included) holding at least one log
/// file, sorted.
pub fn find_log_dirs(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut dirs = vec![];
    collect_log_dirs(root, prefix, &mut dirs)?;
    dirs.sort();
    Ok(dirs)
}

fn collect_log_dirs(dir: &Path, prefix: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut has_logs = false;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_log_dirs(&entry.path(), prefix, out)?;
        } else if file_type.is_file() {
            has_logs |= entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with(prefix))
                .unwrap_or(false);
        }
    }
    if has_logs {
        out.push(dir.to_path_buf());
    }
    Ok(())
}

// ─── Processed-directory bookkeeping ─────────────────────────────────────────

/// Directories already mined, one path per line. A missing state file means
/// nothing has been mined yet.
pub fn load_processed_dirs(state_file: &Path) -> Result<BTreeSet<PathBuf>> {
    if !state_file.exists() {
        return Ok(BTreeSet::new());
    }
    let content = fs::read_to_string(state_file)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Append `dir` to the state file, creating it if needed.
pub fn mark_processed(state_file: &Path, dir: &Path) -> Result<()> {
    if let Some(parent) = state_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(state_file)?;
    writeln!(f, "{}", dir.display())?;
    Ok(())
}

// ─── YAML config I/O ─────────────────────────────────────────────────────────

pub fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T>
where
    T: Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    let val = serde_yaml::from_str(&content)?;
    Ok(val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_logfile() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("LOG.run");
        fs::write(&path, "This is some test content.").unwrap();
        assert_eq!(read_logfile(&path).unwrap(), "This is some test content.");
    }

    #[cfg(unix)]
    #[test]
    fn test_read_logfile_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("LOG.locked");
        fs::write(&path, "secret").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores file modes
        if fs::read(&path).is_ok() {
            return;
        }
        let err = read_logfile(&path).unwrap_err();
        assert!(matches!(err, MineError::PermissionDenied(p) if p == path));
    }

    #[test]
    fn test_read_logfile_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let err = read_logfile(&tmp.path().join("nonexistent_path.txt")).unwrap_err();
        assert!(matches!(err, MineError::FileNotFound(_)));
    }

    #[test]
    fn test_list_log_files_filters_prefix() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("LOG.b"), "").unwrap();
        fs::write(tmp.path().join("LOG.a"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("LOG.dir")).unwrap();

        let files = list_log_files(tmp.path(), "LOG.").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["LOG.a", "LOG.b"]);
    }

    #[test]
    fn test_find_log_dirs_recurses() {
        let tmp = TempDir::new().unwrap();
        let run_a = tmp.path().join("run_a");
        let run_b = tmp.path().join("nested").join("run_b");
        fs::create_dir_all(&run_a).unwrap();
        fs::create_dir_all(&run_b).unwrap();
        fs::create_dir_all(tmp.path().join("empty")).unwrap();
        fs::write(run_a.join("LOG.1"), "").unwrap();
        fs::write(run_b.join("LOG.2"), "").unwrap();

        let dirs = find_log_dirs(tmp.path(), "LOG.").unwrap();
        assert_eq!(dirs, vec![run_b, run_a]);
    }

    #[test]
    fn test_bookkeeping_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let state = tmp.path().join("state").join("mined_dirs.log");
        assert!(load_processed_dirs(&state).unwrap().is_empty());

        mark_processed(&state, Path::new("/data/run_a")).unwrap();
        mark_processed(&state, Path::new("/data/run_b")).unwrap();

        let content = fs::read_to_string(&state).unwrap();
        assert_eq!(content, "/data/run_a\n/data/run_b\n");
        let processed = load_processed_dirs(&state).unwrap();
        assert!(processed.contains(Path::new("/data/run_a")));
        assert!(processed.contains(Path::new("/data/run_b")));
    }
}
