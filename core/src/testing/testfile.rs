//! Test files hold the input and the expected output of one testcase,
//! delimited by a line consisting of three hyphens:
//!
//! ```text
//! input
//! ---
//! output
//! ```

use std::path::Path;

use anyhow::Context as _;

use super::testcase::TestCase;

const DELIMITER: &str = "---";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TestfileError {
    #[error("input and output must be delimited by a line '---'")]
    MissingDelimiter,
}

/// Splits a test file into `(input, output)`.
///
/// The input keeps the newline preceding the delimiter line.
pub fn parse_testfile(text: &str) -> Result<(&str, &str), TestfileError> {
    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        let line_end = line_start + line.len();
        if line.strip_suffix('\n').unwrap_or(line) == DELIMITER {
            return Ok((&text[..line_start], &text[line_end..]));
        }
        line_start = line_end;
    }
    Err(TestfileError::MissingDelimiter)
}

/// Loads every file in `dir` whose name matches `pattern`, in name order.
pub fn load_testcases(dir: impl AsRef<Path>, pattern: &glob::Pattern) -> anyhow::Result<Vec<TestCase>> {
    let files = fsutil::find_files_matching(&dir, pattern).context("Failed to find test files")?;

    let mut testcases = Vec::with_capacity(files.len());
    for file in files {
        let text = fsutil::read_to_string(&file)?;
        let (input, output) = parse_testfile(&text)
            .with_context(|| format!("Test file {:?} is not formatted correctly", file))?;
        let name = file
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string_lossy().into_owned());
        testcases.push(TestCase::new(name, input, output));
    }
    Ok(testcases)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_ok() {
        assert_eq!(parse_testfile("a\nb\n---\nc\n"), Ok(("a\nb\n", "c\n")));
        assert_eq!(parse_testfile("---\nc\n"), Ok(("", "c\n")));
        assert_eq!(parse_testfile("a\n---\n"), Ok(("a\n", "")));
        assert_eq!(parse_testfile("a\n---"), Ok(("a\n", "")));
        assert_eq!(parse_testfile("a\n---\n---\n"), Ok(("a\n", "---\n")));
    }

    #[test]
    fn delimiter_must_be_a_whole_line() {
        assert_eq!(parse_testfile("a---\nb\n---\nc"), Ok(("a---\nb\n", "c")));
        assert_eq!(parse_testfile("a\n----\nb\n"), Err(TestfileError::MissingDelimiter));
        assert_eq!(parse_testfile("a\n--- \nb\n"), Err(TestfileError::MissingDelimiter));
        assert_eq!(parse_testfile(""), Err(TestfileError::MissingDelimiter));
    }

    #[test]
    fn load_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "2\n---\nfour\n").unwrap();
        std::fs::write(dir.path().join("a.txt"), "1\n---\ntwo\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a test").unwrap();

        let pattern = glob::Pattern::new("*.txt").unwrap();
        let testcases = load_testcases(dir.path(), &pattern).unwrap();
        assert_eq!(
            testcases,
            vec![
                TestCase::new("a.txt", "1\n", "two\n"),
                TestCase::new("b.txt", "2\n", "four\n"),
            ]
        );
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.txt"), "no delimiter\n").unwrap();

        let pattern = glob::Pattern::new("*.txt").unwrap();
        let err = load_testcases(dir.path(), &pattern).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.txt"));
    }
}
