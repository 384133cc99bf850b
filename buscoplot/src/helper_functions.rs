use std::env;
use std::path::PathBuf;

use polars::prelude::*;

pub fn project_root() -> PathBuf {
    match env::var_os("PROJECT_ROOT") {
        Some(val) => PathBuf::from(val),
        None => {
            // Fall back to current directory if PROJECT_ROOT not set
            env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        }
    }
}

/// Tab-separated reader; `skip_rows` jumps over leading comment lines so the
/// header row lands where the caller expects it.
pub fn read_tsv(file_path: &str, has_header: bool, skip_rows: usize) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(has_header)
        .with_skip_rows(skip_rows)
        .map_parse_options(|opts| opts.with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(PathBuf::from(file_path)))?
        .finish()
}

/// Lowercase every column name in place.
pub fn lowercase_columns(df: &mut DataFrame) -> PolarsResult<()> {
    let lowered: Vec<PlSmallStr> = df
        .get_column_names()
        .iter()
        .map(|name| PlSmallStr::from(name.to_lowercase()))
        .collect();
    df.set_column_names(lowered)
}
