use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::writer::TEMP_SUFFIX;

/// One parsed data row of a delimited file, with its 1-based line number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    /// Trimmed, unquoted cell values.
    pub cells: Vec<String>,
}

/// Header plus data rows of a comma-separated file.
#[derive(Clone, Debug, Default)]
pub struct Table {
    /// Column names, trimmed.
    pub header: Vec<String>,
    /// Non-empty data rows in file order.
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Position of the first column whose name matches one of `names`.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.header.iter().position(|col| col == name))
    }
}

/// Read a comma-separated file. Blank lines are skipped; simple double-quoted
/// cells are unwrapped. Rows whose width differs from the header are returned
/// as-is so the caller can report them with context.
pub fn read_table(path: &Path) -> io::Result<Table> {
    let content = fs::read_to_string(path)?;
    Ok(parse_table(&content))
}

/// Parse comma-separated text (see [`read_table`]).
pub fn parse_table(content: &str) -> Table {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Table::default();
    };
    let header = split_cells(header.trim_start_matches('\u{feff}'));
    let rows = lines
        .map(|(idx, line)| TableRow {
            line: idx + 1,
            cells: split_cells(line),
        })
        .collect();
    Table { header, rows }
}

fn split_cells(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| {
            let cell = cell.trim();
            cell.strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(cell)
                .to_string()
        })
        .collect()
}

/// Write `bytes` to `path` through a temporary sibling and a rename, so readers
/// never observe a partially written file. Existing files are replaced.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_sibling(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// Immediate subdirectories of `root` that contain any of `marker_files`,
/// returned as sorted directory names.
pub fn subdirs_containing(root: &Path, marker_files: &[&str]) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| {
            marker_files
                .iter()
                .any(|marker| entry.path().join(marker).is_file())
        })
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}
