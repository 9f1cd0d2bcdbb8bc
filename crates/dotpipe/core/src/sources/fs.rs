// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Filesystem sources

use crate::pipe::Pipe;
use crate::stage::{Flow, Stage};
use dotpipe_common::{PipeError, PipeResult, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

fn path_value(path: &Path) -> Value {
    Value::Str(path.display().to_string())
}

fn open_dir(path: &Path) -> PipeResult<fs::ReadDir> {
    fs::read_dir(path).map_err(|e| PipeError::io(path.display().to_string(), e))
}

/// Names of the entries of `dir`, split into directories and everything else
fn split_entries(dir: &Path, follow_symlinks: bool) -> (Vec<Value>, Vec<Value>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return (Vec::new(), Vec::new());
    };
    let mut names: Vec<(String, bool)> = entries
        .filter_map(Result::ok)
        .map(|entry| {
            let is_dir = if follow_symlinks {
                entry.path().is_dir()
            } else {
                entry.file_type().is_ok_and(|t| t.is_dir())
            };
            (entry.file_name().to_string_lossy().into_owned(), is_dir)
        })
        .collect();
    names.sort();

    let (dirs, files): (Vec<_>, Vec<_>) = names.into_iter().partition(|(_, is_dir)| *is_dir);
    let strip = |items: Vec<(String, bool)>| items.into_iter().map(|(name, _)| Value::Str(name)).collect();
    (strip(dirs), strip(files))
}

impl Pipe {
    /// Paths of the entries of the directory at `path`
    pub fn iterdir(path: impl Into<PathBuf>) -> Pipe {
        let path: PathBuf = path.into();
        Self::with_source(Stage::new("iterdir", Vec::new(), move |_| {
            let entries = open_dir(&path)?;
            Ok(Flow::iter(entries.filter_map(Result::ok).map(|entry| path_value(&entry.path()))))
        }))
    }

    /// `(dir, [subdirs], [files])` for every directory below `path`,
    /// parents before children when `top_down`
    pub fn walkdir(path: impl Into<PathBuf>, top_down: bool, follow_symlinks: bool) -> Pipe {
        let path: PathBuf = path.into();
        Self::with_source(Stage::new("walkdir", Vec::new(), move |_| {
            // Surface a missing or unreadable root now; failures below it
            // are skipped
            open_dir(&path)?;
            let walker = WalkDir::new(&path)
                .follow_links(follow_symlinks)
                .contents_first(!top_down)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        warn!(error = %err, "skipping unreadable entry");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_dir())
                .map(move |entry| {
                    let (dirs, files) = split_entries(entry.path(), follow_symlinks);
                    Value::tuple([path_value(entry.path()), Value::List(dirs), Value::List(files)])
                });
            Ok(Flow::iter(walker))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotpipe_common::ErrorKind;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("top.txt"), "x").unwrap();
        fs::write(dir.path().join("a/inner.txt"), "y").unwrap();
        dir
    }

    #[test]
    fn test_iterdir_lists_entries() {
        let dir = tree();
        let mut names: Vec<String> = Pipe::iterdir(dir.path())
            .list()
            .unwrap()
            .into_iter()
            .map(|v| v.as_str().unwrap().rsplit('/').next().unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "top.txt"]);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(Pipe::iterdir(&missing).list().unwrap_err().kind(), ErrorKind::Io);
        assert_eq!(Pipe::walkdir(&missing, true, false).list().unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn test_walkdir_top_down() {
        let dir = tree();
        let rows = Pipe::walkdir(dir.path(), true, false).list().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            Value::tuple([
                path_value(dir.path()),
                Value::list(["a"]),
                Value::list(["top.txt"]),
            ])
        );
        assert_eq!(
            rows[1],
            Value::tuple([
                path_value(&dir.path().join("a")),
                Value::list(["b"]),
                Value::list(["inner.txt"]),
            ])
        );
    }

    #[test]
    fn test_walkdir_bottom_up() {
        let dir = tree();
        let rows = Pipe::walkdir(dir.path(), false, false).list().unwrap();
        let last = rows.last().unwrap().get(0).unwrap();
        assert_eq!(last, path_value(dir.path()));
        assert_eq!(rows[0].get(0).unwrap(), path_value(&dir.path().join("a/b")));
    }
}
