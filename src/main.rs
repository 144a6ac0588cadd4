use contrib_metrics::{
    AxiomConfig, AxiomsConfig, EngineConfig, GameRow, IndexKind, IndicesConfig, MetricsInput,
};
use tabled::{settings::Style, Table};

fn main() {
    env_logger::init();

    // A three-player game where the {0,1} pairing carries all the synergy.
    let rows: Vec<GameRow> = [
        ("{}", 0.0),
        ("{0}", 1.0),
        ("{1}", 1.0),
        ("{2}", 1.0),
        ("{0,1}", 4.0),
        ("{0,2}", 2.0),
        ("{1,2}", 2.0),
        ("{0,1,2}", 5.0),
    ]
    .into_iter()
    .map(|(coalition, value)| {
        GameRow::new("demo", "0", coalition.parse().expect("literal"), Some(value), None)
    })
    .collect();

    let mut indices = IndicesConfig::default();
    indices.enabled = [
        IndexKind::ShapleyExact,
        IndexKind::Banzhaf,
        IndexKind::Synergy,
        IndexKind::ShapleyInteraction,
        IndexKind::BanzhafInteraction,
        IndexKind::OrdinalBanzhaf,
        IndexKind::LexCel,
        IndexKind::GroupOrdinalBanzhaf,
        IndexKind::GroupLexCel,
    ]
    .into_iter()
    .collect();

    let config = match EngineConfig::builder()
        .indices(indices)
        .axioms(AxiomsConfig {
            swimmy: AxiomConfig {
                enabled: true,
                rules: vec![],
            },
            sada: AxiomConfig {
                enabled: true,
                rules: vec![],
            },
        })
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error building configuration: {e}");
            return;
        }
    };

    match MetricsInput::new(rows, config).compute() {
        Err(e) => eprintln!("Error computing contribution metrics: {e}"),
        Ok(output) => {
            let style = Style::psql();
            println!("individuals:");
            println!("{}", Table::new(&output.individuals).with(style.clone()));
            println!("\ncoalitions:");
            println!("{}", Table::new(&output.coalitions).with(style.clone()));
            println!("\naxioms (swimmy):");
            println!("{}", Table::new(&output.swimmy).with(style.clone()));
            println!("\naxioms (sada):");
            println!("{}", Table::new(&output.sada).with(style));

            for diagnostic in &output.diagnostics {
                for warning in &diagnostic.warnings {
                    eprintln!("warning: {warning}");
                }
            }
        }
    }
}
