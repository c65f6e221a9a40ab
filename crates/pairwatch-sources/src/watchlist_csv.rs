use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// One row of a watchlist export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub title: String,
    pub added_at: DateTime<Utc>,
}

/// Parse a watchlist export with an "added" timestamp column and a "title"
/// column. Header matching is case-insensitive; other columns are ignored.
pub fn parse_watchlist_export<P: AsRef<Path>>(path: P) -> Result<Vec<ExportRow>> {
    let file = File::open(path)?;
    parse_watchlist_reader(file)
}

pub fn parse_watchlist_reader<R: Read>(input: R) -> Result<Vec<ExportRow>> {
    let mut reader = Reader::from_reader(input);

    let headers = reader.headers()?.clone();
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    let available_columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    debug!(columns = ?available_columns, "CSV columns");

    let title_col = header_map
        .get("title")
        .copied()
        .or_else(|| find_column(&header_map, "title"))
        .ok_or_else(|| anyhow!("Missing required column: Title. Available columns: {:?}", available_columns))?;

    // Added time is optional - rows fall back to the import time
    let added_col = find_column(&header_map, "added");
    if added_col.is_none() {
        warn!("CSV has no 'added' column, every row gets the current time");
    }

    let mut rows = Vec::new();
    let mut row_count = 0;
    for result in reader.records() {
        let record = result?;
        row_count += 1;

        let title = record.get(title_col).unwrap_or("").trim().to_string();
        if title.is_empty() {
            debug!(row = row_count, "Skipping row with empty title");
            continue;
        }

        let added_raw = added_col.and_then(|i| record.get(i)).unwrap_or("").trim();
        let added_at = match parse_added_time(added_raw) {
            Some(ts) => ts,
            None => {
                if !added_raw.is_empty() {
                    debug!(row = row_count, added = %added_raw, "Unparseable added time, using now");
                }
                Utc::now()
            }
        };

        rows.push(ExportRow {
            row: row_count,
            title,
            added_at,
        });
    }

    info!(rows = row_count, titles = rows.len(), "Parsed watchlist export");
    Ok(rows)
}

fn find_column(header_map: &HashMap<String, usize>, needle: &str) -> Option<usize> {
    let mut candidates: Vec<(&String, &usize)> = header_map.iter().filter(|(h, _)| h.contains(needle)).collect();
    // Lowest index wins so the choice is deterministic.
    candidates.sort_by_key(|(_, i)| **i);
    candidates.first().map(|(_, i)| **i)
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, or `YYYY-MM-DD`.
pub fn parse_added_time(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_export_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Added Time,Title,Notes").unwrap();
        writeln!(file, "2023-05-01 20:15:00,The Bear,from Sam").unwrap();
        writeln!(file, "2023-05-02,\"Crouching Tiger, Hidden Dragon\",").unwrap();
        writeln!(file, "2023-05-03T08:00:00+02:00,Severance,").unwrap();

        let rows = parse_watchlist_export(file.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].title, "The Bear");
        assert_eq!(rows[0].added_at, Utc.with_ymd_and_hms(2023, 5, 1, 20, 15, 0).unwrap());
        assert_eq!(rows[1].title, "Crouching Tiger, Hidden Dragon");
        assert_eq!(rows[1].added_at, Utc.with_ymd_and_hms(2023, 5, 2, 0, 0, 0).unwrap());
        assert_eq!(rows[2].added_at, Utc.with_ymd_and_hms(2023, 5, 3, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_empty_titles_skipped_and_rows_numbered() {
        let csv = "title,added\nDune,2024-01-01\n,2024-01-02\nArrival,not a date\n";
        let rows = parse_watchlist_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[1].row, 3);
        assert_eq!(rows[1].title, "Arrival");
    }

    #[test]
    fn test_missing_title_column_is_an_error() {
        let csv = "Added Time,Name\n2024-01-01,Dune\n";
        let err = parse_watchlist_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Missing required column: Title"));
    }

    #[test]
    fn test_missing_added_column_uses_import_time() {
        let before = Utc::now();
        let rows = parse_watchlist_reader("Title\nDune\nArrival\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.added_at >= before && r.added_at <= Utc::now()));
    }
}
