use std::io::{stdin, stdout, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use belbin_roles::chart::ChartRenderer;
use belbin_roles::{
    export_csv, telemetry, Answer, AppConfig, Error, QuestionKind, ResultStore, Role,
    ScoringEngine, Session, StoredResult, Variant, DEFAULT_TOP_N,
};

#[derive(Parser, Debug)]
#[command(name = "belbin", about = "Belbin Team Roles questionnaire", version)]
struct Cli {
    /// Question bank to use, overriding BELBIN_VARIANT
    #[arg(long, value_enum)]
    variant: Option<Variant>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take the questionnaire interactively (default command)
    Take {
        /// Respondent name; asked for when omitted
        #[arg(long)]
        name: Option<String>,
    },
    /// List stored results for a user, newest first
    History { username: String },
    /// Show usage statistics
    Stats {
        /// Also write a popularity chart
        #[arg(long)]
        chart: bool,
    },
    /// Delete every stored result for a user
    Delete { username: String },
    /// Draw a pie chart of a user's latest result
    Chart {
        username: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Draw a bar chart comparing the latest results of several users
    Compare { usernames: Vec<String> },
    /// Export every stored result as CSV
    Export { path: PathBuf },
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    if let Err(err) = telemetry::init(&config.log_level) {
        eprintln!("{err}");
    }

    let store = ResultStore::from_config(&config);
    let persistent = match store.initialize() {
        Ok(()) => true,
        Err(err) => {
            error!(%err, "continuing without persistence");
            false
        }
    };
    let charts = ChartRenderer::new(&config.chart_dir);
    let variant = cli.variant.unwrap_or(config.variant);

    match cli.command.unwrap_or(Command::Take { name: None }) {
        Command::Take { name } => take(variant, name, persistent.then_some(&store), &charts),
        Command::History { username } => {
            let results = store.user_results(&username);
            if results.is_empty() {
                println!("No results for {username}.");
            }
            for result in &results {
                print_result(result);
            }
            Ok(())
        }
        Command::Stats { chart } => {
            let statistics = store.statistics();
            println!("Total tests:  {}", statistics.total_tests);
            println!("Unique users: {}", statistics.unique_users);
            for (role, count) in &statistics.popular_roles {
                println!("  {:<22} {}", role.name(), count);
            }
            if chart {
                match charts.statistics_chart(&statistics, None) {
                    Ok(path) => println!("Chart: {}", path.display()),
                    Err(Error::EmptyInput) => println!("Nothing to chart yet."),
                    Err(err) => return Err(err),
                }
            }
            Ok(())
        }
        Command::Delete { username } => {
            let deleted = store.delete_user_results(&username)?;
            println!("Deleted {deleted} result(s) for {username}.");
            Ok(())
        }
        Command::Chart { username, output } => match store.latest_result(&username) {
            Some(result) => {
                let path = charts.pie_chart(&result.scores, &username, output.as_deref())?;
                println!("Chart: {}", path.display());
                Ok(())
            }
            None => {
                println!("No results for {username}.");
                Ok(())
            }
        },
        Command::Compare { usernames } => {
            let entries = usernames
                .iter()
                .filter_map(|username| {
                    store
                        .latest_result(username)
                        .map(|result| (username.clone(), result.scores))
                })
                .collect::<Vec<_>>();
            match charts.comparison_chart(&entries, None) {
                Ok(path) => println!("Chart: {}", path.display()),
                Err(Error::EmptyInput) => println!("Nothing to chart yet."),
                Err(err) => return Err(err),
            }
            Ok(())
        }
        Command::Export { path } => {
            let file = std::fs::File::create(&path)?;
            export_csv(&store.all_results(), file)?;
            println!("Exported to {}", path.display());
            Ok(())
        }
    }
}

fn take(
    variant: Variant,
    name: Option<String>,
    store: Option<&ResultStore>,
    charts: &ChartRenderer,
) -> Result<(), Error> {
    let bank = variant.bank();
    let mut input = stdin().lock();

    println!("{}", bank.title);
    let mut session = match name {
        Some(name) => Session::new(bank, &name)?,
        None => loop {
            let Some(line) = prompt(&mut input, "Your name: ")? else {
                return Ok(());
            };
            match Session::new(bank, &line) {
                Ok(session) => break session,
                Err(err) => println!("{err}"),
            }
        },
    };

    println!("{}", bank.instruction);
    'questions: for (index, question) in bank.questions().iter().enumerate() {
        println!();
        println!("{}. {}", question.id, question.text);
        for option in &question.options {
            println!("  {}) {}", option.key, option.text);
        }
        let hint = match question.kind {
            QuestionKind::SingleChoice => "Choice: ",
            QuestionKind::PointAllocation => "Points (e.g. a=5;c=3;g=2): ",
        };
        loop {
            let Some(line) = prompt(&mut input, hint)? else {
                // input closed; score what we have
                break 'questions;
            };
            let answer = Answer::parse(question.kind, &line);
            match answer.and_then(|answer| session.answer(index, answer)) {
                Ok(()) => break,
                Err(err) => println!("{err}"),
            }
        }
    }

    let submission = session.finish();
    let engine = ScoringEngine::new(bank);
    let scores = engine.calculate_results(&submission.answers);

    println!();
    println!("Results for {}", submission.username);
    for (rank, (role, score)) in engine
        .primary_roles(&scores, DEFAULT_TOP_N)
        .iter()
        .enumerate()
    {
        println!("  {}. {:<22} {}", rank + 1, role.name(), score);
    }
    println!();
    println!("{}", engine.interpretation(&scores));

    if let Some(store) = store {
        match store.save(&submission.username, &scores) {
            Ok(id) => println!("Saved as result #{id}."),
            Err(err) => println!("Could not save the result: {err}"),
        }
    }
    match charts.pie_chart(&scores, &submission.username, None) {
        Ok(path) => println!("Chart: {}", path.display()),
        Err(Error::EmptyInput) => println!("No scores to chart."),
        Err(err) => println!("Could not draw the chart: {err}"),
    }
    Ok(())
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<Option<String>, Error> {
    print!("{label}");
    stdout().flush()?;
    let mut buffer = String::new();
    if input.read_line(&mut buffer)? == 0 {
        return Ok(None);
    }
    Ok(Some(buffer.trim().to_string()))
}

fn print_result(result: &StoredResult) {
    let name_of = |role: Option<Role>| role.map(|role| role.name()).unwrap_or("-");
    println!(
        "#{} {}  primary: {}  secondary: {}",
        result.id,
        result.timestamp.format("%Y-%m-%d %H:%M:%S"),
        name_of(result.primary_role),
        name_of(result.secondary_role)
    );
    let scores = result
        .scores
        .iter()
        .map(|(role, score)| format!("{}={}", role.code(), score))
        .collect::<Vec<_>>();
    println!("    {}", scores.join(" "));
}
