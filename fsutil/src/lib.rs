use std::{
    fs::{self, ReadDir},
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("Not a directory: '{0}'")]
        NotDir(PathBuf),
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

/// Lists regular files directly under `dir` whose file name matches `pattern`,
/// sorted by file name.
#[must_use]
pub fn find_files_matching(dir: impl AsRef<Path>, pattern: &glob::Pattern) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::NotDir(dir.to_owned()));
    }

    let mut files = Vec::new();
    for entry in self::read_dir(dir)? {
        let entry = entry.map_err(|e| Error::SingleIO("Cannot access dir entry", dir.to_owned(), e))?;
        let Ok(ft) = entry.file_type() else {
            log::debug!("Skip {:?}: cannot get file type", entry.path());
            continue
        };
        if ft.is_dir() {
            continue;
        }
        if pattern.matches(&entry.file_name().to_string_lossy()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Find `filename` in `cur_dir` and its ancestors, nearest first.
pub fn find_in_ancestors(cur_dir: impl AsRef<Path>, filename: &str) -> Option<PathBuf> {
    cur_dir
        .as_ref()
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn find_files_matching_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt", "c.md", "10.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let pattern = glob::Pattern::new("*.txt").unwrap();
        let files = find_files_matching(dir.path(), &pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["10.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn find_files_matching_rejects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = glob::Pattern::new("*").unwrap();
        let err = find_files_matching(dir.path().join("nope"), &pattern).unwrap_err();
        assert!(matches!(err, Error::NotDir(_)));
    }

    #[test]
    fn find_in_ancestors_finds_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("x").join("y");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("conf.toml"), "").unwrap();
        fs::write(dir.path().join("x").join("conf.toml"), "").unwrap();

        assert_eq!(
            find_in_ancestors(&nested, "conf.toml"),
            Some(dir.path().join("x").join("conf.toml"))
        );
        assert_eq!(find_in_ancestors(&nested, "missing.toml"), None);
    }

    #[test]
    fn read_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = read_to_string(&path).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}
