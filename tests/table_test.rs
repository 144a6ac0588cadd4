#![cfg(feature = "csv")]

use contrib_metrics::io::{
    default_output_dir, read_game_table, read_game_table_from, write_output_tables,
};
use contrib_metrics::{EngineConfig, IndexKind, IndicesConfig, MetricsInput};
use std::fs;
use std::path::PathBuf;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("contrib-metrics-tests")
        .join(format!("{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

const TABLE: &str = "\
scenario_id,game_id,coalition,value
s0,g0,{},0.0
s0,g0,{0},1.0
s0,g0,{1},1.0
s0,g0,\"{0,1}\",3.0
";

#[test]
fn test_csv_round_trip() {
    let dir = temp_dir("round-trip");
    let input_path = dir.join("games.csv");
    fs::write(&input_path, TABLE).unwrap();

    let rows = read_game_table(&input_path).unwrap();
    assert_eq!(rows.len(), 4);

    let mut indices = IndicesConfig::default();
    indices.enabled = [
        IndexKind::ShapleyExact,
        IndexKind::Banzhaf,
        IndexKind::Synergy,
        IndexKind::ShapleyInteraction,
        IndexKind::GroupLexCel,
    ]
    .into_iter()
    .collect();
    let config = EngineConfig::builder().indices(indices).build().unwrap();
    let output = MetricsInput::new(rows, config).compute().unwrap();

    let out_dir = dir.join("out");
    write_output_tables(&out_dir, &output).unwrap();

    let individuals = fs::read_to_string(out_dir.join("individuals.csv")).unwrap();
    let mut lines = individuals.lines();
    assert_eq!(
        lines.next().unwrap(),
        "scenario_id,game_id,player,shapley,shapley_rank,banzhaf,banzhaf_rank,\
         ordinal_banzhaf_score,ordinal_banzhaf_rank,lex_cel_theta,lex_cel_rank"
    );
    let first = lines.next().unwrap();
    assert!(first.starts_with("s0,g0,0,1.5,1,0.5,1,"));

    let coalitions = fs::read_to_string(out_dir.join("coalitions.csv")).unwrap();
    // The pair coalition keeps its braces through quoting.
    assert!(coalitions.contains("\"{0,1}\""));

    // No axiom was enabled, so no axiom table lands on disk.
    assert!(!out_dir.join("axioms_swimmy.csv").exists());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_reading_back_written_individuals() {
    let rows =
        read_game_table_from(csv::Reader::from_reader(TABLE.as_bytes())).unwrap();
    let output = MetricsInput::new(rows, EngineConfig::default())
        .compute()
        .unwrap();

    let dir = temp_dir("read-back");
    write_output_tables(&dir, &output).unwrap();

    let mut reader = csv::Reader::from_path(dir.join("individuals.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[2], "player");
    let records: Vec<csv::StringRecord> =
        reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), output.individuals.len());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_default_output_dir_convention() {
    assert_eq!(
        default_output_dir("data/batch7/games.csv"),
        PathBuf::from("outputs/data/batch7/games")
    );
}
