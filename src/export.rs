use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{LoctreeError, Result};

/// A row type with a fixed, declared column schema. CSV and text output use
/// `COLUMNS` as the header; `cells` must return one entry per column, `None`
/// for null.
pub trait Tabular: Serialize {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Option<String>>;
}

pub fn cell<T: ToString>(value: &Option<T>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

pub fn to_json<T: Serialize>(rows: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

pub fn to_csv<T: Tabular>(rows: &[T]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(T::COLUMNS)?;
    for row in rows {
        let cells = row.cells();
        wtr.write_record(cells.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| LoctreeError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| LoctreeError::Other(e.to_string()))
}

/// Fixed-width table: each column as wide as its longest header or value,
/// cells separated by " | ", a dashed rule under the header.
pub fn to_text<T: Tabular>(rows: &[T]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.cells().into_iter().map(Option::unwrap_or_default).collect())
        .collect();

    let widths: Vec<usize> = T::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|v| v.chars().count())
                .fold(h.chars().count(), usize::max)
        })
        .collect();

    let mut out = pad_line(T::COLUMNS.iter().copied(), &widths);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&pad_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn pad_line<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(v, &w)| format!("{v:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub struct WrittenReport {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub text: PathBuf,
}

/// Write `{stem}.json`, `{stem}.csv` and `{stem}.txt` into `dir`, all in the
/// same row order.
pub fn write_report<T: Tabular>(dir: &Path, stem: &str, rows: &[T]) -> Result<WrittenReport> {
    std::fs::create_dir_all(dir)?;
    let report = WrittenReport {
        json: dir.join(format!("{stem}.json")),
        csv: dir.join(format!("{stem}.csv")),
        text: dir.join(format!("{stem}.txt")),
    };
    std::fs::write(&report.json, to_json(rows)?)?;
    std::fs::write(&report.csv, to_csv(rows)?)?;
    std::fs::write(&report.text, to_text(rows))?;
    tracing::info!(rows = rows.len(), stem, "report written");
    Ok(report)
}
