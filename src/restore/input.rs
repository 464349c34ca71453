use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{BackupError, Result};
use crate::tracker::report::{BACKUP_FAILED_SENTINEL, NO_FAILED_SENTINEL};

/// Where restore input comes from. All given sources are merged.
#[derive(Debug, Clone, Default)]
pub struct RestoreInput {
    /// Directory scanned for files with the kind's suffix.
    pub dir: Option<PathBuf>,
    /// Files named explicitly.
    pub files: Vec<PathBuf>,
    /// File listing one path per line, usually a previous result file.
    pub log_file: Option<PathBuf>,
}

impl RestoreInput {
    pub fn is_empty(&self) -> bool {
        self.dir.is_none() && self.files.is_empty() && self.log_file.is_none()
    }

    /// Short form of the given sources for reports.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(dir) = &self.dir {
            parts.push(dir.display().to_string());
        }
        parts.extend(self.files.iter().map(|f| f.display().to_string()));
        if let Some(log_file) = &self.log_file {
            parts.push(log_file.display().to_string());
        }
        parts.join(",")
    }
}

/// Splits a comma separated file list, ignoring blanks.
pub fn split_file_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(suffix))
}

fn scan_dir(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| BackupError::io(dir, e))? {
        let path = entry.map_err(|e| BackupError::io(dir, e))?.path();
        if path.is_file() && has_suffix(&path, suffix) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn read_log_file(log_file: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let text = fs::read_to_string(log_file).map_err(|e| BackupError::io(log_file, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| *line != NO_FAILED_SENTINEL && *line != BACKUP_FAILED_SENTINEL)
        .map(PathBuf::from)
        .filter(|path| {
            let keep = has_suffix(path, suffix);
            if !keep {
                warn!(path = %path.display(), suffix, "Ignoring listed file with another suffix.");
            }
            keep
        })
        .collect())
}

/// Merges every source into one ordered set without duplicates: directory
/// files first, then explicit files, then the log file's entries.
pub fn collect_files(input: &RestoreInput, suffix: &str) -> Result<Vec<PathBuf>> {
    if input.is_empty() {
        return Err(BackupError::InvalidInput(
            "No restore input: give a directory, a file list or a log file".to_string(),
        ));
    }

    let mut merged: Vec<PathBuf> = Vec::new();
    let mut add = |path: PathBuf| {
        if !merged.contains(&path) {
            merged.push(path);
        }
    };

    if let Some(dir) = &input.dir {
        scan_dir(dir, suffix)?.into_iter().for_each(&mut add);
    }
    input.files.iter().cloned().for_each(&mut add);
    if let Some(log_file) = &input.log_file {
        read_log_file(log_file, suffix)?.into_iter().for_each(&mut add);
    }

    if merged.is_empty() {
        return Err(BackupError::InvalidInput(format!(
            "No {suffix} files found in the restore input"
        )));
    }
    debug!(files = merged.len(), "Collected restore input.");
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUFFIX: &str = ".alert-conditions.bak";

    #[test]
    fn test_sources_are_merged_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a-1.alert-conditions.bak");
        let b = dir.path().join("b-2.alert-conditions.bak");
        fs::write(&a, "{}").unwrap();
        fs::write(&b, "{}").unwrap();
        fs::write(dir.path().join("c.monitor.bak"), "{}").unwrap();

        let extra = dir.path().join("elsewhere.alert-conditions.bak");
        let log = dir.path().join("fail.log");
        fs::write(
            &log,
            format!("{}\n\n  {}  \n/tmp/x/other.monitor.bak\n", b.display(), extra.display()),
        )
        .unwrap();

        let input = RestoreInput {
            dir: Some(dir.path().to_path_buf()),
            files: vec![a.clone()],
            log_file: Some(log),
        };
        let files = collect_files(&input, SUFFIX).unwrap();
        assert_eq!(files, vec![a, b, extra]);
    }

    #[test]
    fn test_sentinel_only_log_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("result.log");
        fs::write(&log, NO_FAILED_SENTINEL).unwrap();

        let input = RestoreInput {
            log_file: Some(log),
            ..Default::default()
        };
        assert!(matches!(
            collect_files(&input, SUFFIX),
            Err(BackupError::InvalidInput(_))
        ));
        assert!(matches!(
            collect_files(&RestoreInput::default(), SUFFIX),
            Err(BackupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_split_file_list() {
        assert_eq!(
            split_file_list("a.bak, b.bak,,"),
            vec![PathBuf::from("a.bak"), PathBuf::from("b.bak")]
        );
    }
}
