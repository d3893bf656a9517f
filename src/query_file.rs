//! Reading the query text from disk.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{PgCsvError, Result};

/// How the lines of a query file are glued back together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineJoin {
    /// Every line is followed by a single space. Line comments (`-- ...`)
    /// swallow the rest of the query with this mode.
    #[default]
    Space,
    /// Every line is followed by a newline.
    Newline,
}

impl LineJoin {
    fn separator(self) -> char {
        match self {
            LineJoin::Space => ' ',
            LineJoin::Newline => '\n',
        }
    }
}

/// Read a query file and reduce it to a single query string.
///
/// Line terminators (`\n` or `\r\n`) are dropped and each line is followed by
/// the separator chosen by `join`. An empty file yields an empty string.
pub fn load_query(path: &Path, join: LineJoin) -> Result<String> {
    let to_err = |source| PgCsvError::QueryFile {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_err)?;
    let query = join_lines(BufReader::new(file), join).map_err(to_err)?;

    debug!(path = %path.display(), bytes = query.len(), "loaded query text");
    Ok(query)
}

fn join_lines<R: BufRead>(reader: R, join: LineJoin) -> std::io::Result<String> {
    let separator = join.separator();
    let mut query = String::new();
    for line in reader.lines() {
        query.push_str(&line?);
        query.push(separator);
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn write_query(contents: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.sql");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_lines_joined_with_trailing_space() {
        let (_dir, path) = write_query(b"SELECT id, name\nFROM users\nORDER BY id;\n");
        let query = load_query(&path, LineJoin::Space).unwrap();
        assert_eq!(query, "SELECT id, name FROM users ORDER BY id; ");
    }

    #[test]
    fn test_last_line_without_newline_still_gets_space() {
        let (_dir, path) = write_query(b"SELECT 1\nFROM dual");
        let query = load_query(&path, LineJoin::Space).unwrap();
        assert_eq!(query, "SELECT 1 FROM dual ");
    }

    #[test]
    fn test_crlf_line_endings_are_stripped() {
        let (_dir, path) = write_query(b"SELECT 1\r\nFROM t\r\n");
        let query = load_query(&path, LineJoin::Space).unwrap();
        assert_eq!(query, "SELECT 1 FROM t ");
        assert!(!query.contains('\r'));
    }

    #[test]
    fn test_empty_file_is_empty_query() {
        let (_dir, path) = write_query(b"");
        assert_eq!(load_query(&path, LineJoin::Space).unwrap(), "");
    }

    #[test]
    fn test_blank_lines_become_single_spaces() {
        let query = join_lines(Cursor::new("a\n\nb\n"), LineJoin::Space).unwrap();
        assert_eq!(query, "a  b ");
    }

    #[test]
    fn test_line_comment_swallows_following_lines_in_space_mode() {
        let text = "SELECT id -- primary key\nFROM users\n";
        let query = join_lines(Cursor::new(text), LineJoin::Space).unwrap();
        assert_eq!(query, "SELECT id -- primary key FROM users ");
    }

    #[test]
    fn test_newline_mode_keeps_line_comments_terminated() {
        let text = "SELECT id -- primary key\nFROM users\n";
        let query = join_lines(Cursor::new(text), LineJoin::Newline).unwrap();
        assert_eq!(query, "SELECT id -- primary key\nFROM users\n");
    }

    #[test]
    fn test_missing_file_is_query_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dat");
        match load_query(&path, LineJoin::Space).unwrap_err() {
            PgCsvError::QueryFile { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("Expected QueryFile error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_query_file_error() {
        let (_dir, path) = write_query(b"SELECT '\xff\xfe'\n");
        match load_query(&path, LineJoin::Space).unwrap_err() {
            PgCsvError::QueryFile { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
            }
            other => panic!("Expected QueryFile error, got {:?}", other),
        }
    }
}
