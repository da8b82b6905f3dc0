use belbin_roles::{read_bulk, telemetry, AppConfig, Error, ResultStore, ScoringEngine, Variant};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;

/// Scores a CSV file of answer sheets.
#[derive(Parser)]
struct Args {
    path: String,
    /// Question bank the sheets answer, overriding BELBIN_VARIANT
    #[arg(long, value_enum)]
    variant: Option<Variant>,
    /// Store every valid row in the result database
    #[arg(long)]
    save: bool,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    let config = AppConfig::load()?;
    if let Err(err) = telemetry::init(&config.log_level) {
        eprintln!("{err}");
    }

    let bank = args.variant.unwrap_or(config.variant).bank();
    let engine = ScoringEngine::new(bank);
    let store = if args.save {
        let store = ResultStore::from_config(&config);
        store.initialize()?;
        Some(store)
    } else {
        None
    };

    let reader = BufReader::new(File::open(&args.path)?);
    for (line, row) in read_bulk(reader, bank).enumerate() {
        match row {
            Ok(submission) => {
                let scores = engine.calculate_results(&submission.answers);
                let (primary, secondary) = scores.primary_and_secondary();
                println!(
                    "username = {}, scores = {}, primary = {}, secondary = {}",
                    submission.username,
                    serde_json::to_string(&scores)?,
                    primary.map(|role| role.id()).unwrap_or("-"),
                    secondary.map(|role| role.id()).unwrap_or("-"),
                );
                if let Some(store) = &store {
                    store.save(&submission.username, &scores)?;
                }
            }
            Err(e) => {
                // header is line 1
                eprintln!("line {}: {}", line + 2, e);
            }
        }
    }
    Ok(())
}
