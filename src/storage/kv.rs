//! Line-oriented `key=value` encoding shared by every section file.
//!
//! - scalars: `key=value`, the value is the rest of the line
//! - lists: `key=v1, v2, v3`, or `key=` when empty
//! - booleans: `true` / `false`
//!
//! Values cannot contain newlines; nothing is escaped.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::storage::error::{StorageError, StorageResult};

const LIST_SEPARATOR: &str = ", ";

/// value of `line` if it starts with `key=`
pub(crate) fn get_str<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key)?.strip_prefix('=')
}

/// integer value of `key=`; `None` if the key is absent or not a number
pub(crate) fn get_int<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    get_str(line, key)?.parse().ok()
}

/// boolean value of `key=`; only the literals `true` and `false` count
pub(crate) fn get_bool(line: &str, key: &str) -> Option<bool> {
    match get_str(line, key)? {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub(crate) fn split_list(value: &str) -> Vec<&str> {
    if value.is_empty() {
        Vec::new()
    } else {
        value.split(LIST_SEPARATOR).collect()
    }
}

pub(crate) fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(LIST_SEPARATOR);
        }
        out.push_str(item.as_ref());
    }
    out
}

/// Read a section file as lines; `None` when the file does not exist.
pub(crate) fn read_lines(path: &Path) -> StorageResult<Option<Vec<String>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    let lines = BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::io(path, e))?;

    Ok(Some(lines))
}

/// Replace a section file with `contents`.
pub(crate) fn write_file(path: &Path, contents: &str) -> StorageResult<()> {
    let file = File::create(path).map_err(|e| StorageError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(contents.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| StorageError::io(path, e))
}
