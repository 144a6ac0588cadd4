//! Reading the input game table and writing the result tables as CSV.
//!
//! The engine itself never touches the filesystem; these helpers exist for
//! hosts that speak CSV and for round-trip tests of the output layout.

use crate::engine::MetricsOutput;
use crate::error::{MetricsError, Result};
use crate::types::GameRow;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a game table from a CSV file with columns
/// `scenario_id, game_id, coalition[, value][, rank]`.
pub fn read_game_table<P: AsRef<Path>>(path: P) -> Result<Vec<GameRow>> {
    read_game_table_from(csv::Reader::from_path(path)?)
}

/// Read a game table from any CSV source, e.g. an in-memory string.
pub fn read_game_table_from<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<GameRow>> {
    let headers = reader.headers()?.clone();
    for required in ["scenario_id", "game_id", "coalition"] {
        if !headers.iter().any(|h| h == required) {
            return Err(MetricsError::MissingColumn(required));
        }
    }

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: GameRow = record?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write any serializable row table to a CSV file.
pub fn write_table<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Default output directory for an input table:
/// `outputs/<parent-of-input>/<input-stem>/`.
pub fn default_output_dir<P: AsRef<Path>>(input: P) -> PathBuf {
    let input = input.as_ref();
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    let stem = input.file_stem().unwrap_or_default();
    Path::new("outputs").join(parent).join(stem)
}

/// Write the individuals, coalitions, and enabled axiom tables under
/// `dir`, creating it if needed.
pub fn write_output_tables<P: AsRef<Path>>(dir: P, output: &MetricsOutput) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    write_table(dir.join("individuals.csv"), &output.individuals)?;
    write_table(dir.join("coalitions.csv"), &output.coalitions)?;
    if !output.swimmy.is_empty() {
        write_table(dir.join("axioms_swimmy.csv"), &output.swimmy)?;
    }
    if !output.sada.is_empty() {
        write_table(dir.join("axioms_sada.csv"), &output.sada)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_game_table_from_csv() {
        let data = "\
scenario_id,game_id,coalition,value,rank
s0,g0,{0},1.0,
s0,g0,{1},2.0,
s0,g0,\"{0,1}\",3.5,1
";
        let rows =
            read_game_table_from(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].coalition.to_string(), "{0}");
        assert_eq!(rows[0].value, Some(1.0));
        assert_eq!(rows[0].rank, None);
        assert_eq!(rows[2].coalition.to_string(), "{0,1}");
        assert_eq!(rows[2].rank, Some(1));
    }

    #[test]
    fn test_read_rejects_missing_required_column() {
        let data = "\
scenario_id,game_id,value
s0,g0,1.0
";
        let err =
            read_game_table_from(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(matches!(err, MetricsError::MissingColumn("coalition")));
    }

    #[test]
    fn test_read_rejects_non_integer_rank() {
        let data = "\
scenario_id,game_id,coalition,value,rank
s0,g0,{0},1.0,1.5
";
        assert!(read_game_table_from(csv::Reader::from_reader(data.as_bytes())).is_err());
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir("data/runs/table.csv"),
            PathBuf::from("outputs/data/runs/table")
        );
        assert_eq!(default_output_dir("table.csv"), PathBuf::from("outputs/table"));
    }
}
