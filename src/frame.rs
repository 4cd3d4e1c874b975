//! Conversion of a worksheet's cell grid into a Polars [`DataFrame`].
//!
//! The first row is the header and every column is kept as `String`; no type
//! inference happens here.

use crate::error::Result;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

/// Convert rows of cells (first row = header) into a table.
///
/// The table is as wide as the widest row. Short rows are padded with empty
/// strings and a short header is padded with empty names, which are then made
/// unique like any other duplicate. An empty grid yields an empty table.
pub fn grid_to_dataframe(grid: &[Vec<String>]) -> Result<DataFrame> {
    let Some((header_row, data_rows)) = grid.split_first() else {
        return Ok(DataFrame::empty());
    };

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);

    // Padding names are not the sheet's own duplicates
    let duplicates = duplicate_names(header_row);
    if !duplicates.is_empty() {
        warn!(
            ?duplicates,
            "Found duplicate column names, suffixes added to make them unique"
        );
    }

    let columns: Vec<Column> = unique_column_names(&padded_header(header_row, width))
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<&str> = data_rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect();
            Series::new(name.as_str().into(), values).into()
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Make column names unique by appending `_1`, `_2`, … to repeats.
///
/// `[a, b, a, a]` becomes `[a, b, a_1, a_2]`. A suffixed name that is already
/// taken keeps counting up, so the result never contains duplicates.
pub fn unique_column_names(headers: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());

    for header in headers {
        let mut candidate = header.clone();

        if taken.contains(&candidate) {
            let counter = counters.entry(header.as_str()).or_insert(0);
            loop {
                *counter += 1;
                candidate = format!("{}_{}", header, counter);
                if !taken.contains(&candidate) {
                    break;
                }
            }
        }

        taken.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

fn padded_header(header_row: &[String], width: usize) -> Vec<String> {
    let mut header = header_row.to_vec();
    header.resize(width, String::new());
    header
}

fn duplicate_names(headers: &[String]) -> BTreeSet<&str> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .filter(|h| !seen.insert(h.as_str()))
        .map(String::as_str)
        .collect()
}
