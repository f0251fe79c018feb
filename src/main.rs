use clap::{Parser, Subcommand};
use deck_odds::engine::exact::exact_from_prepared;
use deck_odds::engine::simulation::{compute_simulation_parallel, simulate_prepared};
use deck_odds::engine::{select_engine, CalculationMode, CalculationResult, EngineMode, Prepared, SimulationConfig};
use deck_odds::rng::GameRng;
use deck_odds::Scenario;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deck-odds")]
#[command(about = "Opening hand probability calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Scenario file with deck, cards, patterns, pot and labels
    #[arg(short, long, default_value = "scenario.json")]
    input: String,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Enumerate every possible hand
    Exact,

    /// Estimate rates by shuffling the deck many times
    Simulate {
        /// Number of trials
        #[arg(short = 'n', long, default_value = "100000")]
        trials: u64,

        /// Seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Run trials on all cores
        #[arg(short, long)]
        parallel: bool,

        /// Independently seeded batches when running in parallel
        #[arg(long, default_value = "16")]
        chunks: usize,

        /// Also check required_distinct conditions
        #[arg(long)]
        honor_distinct: bool,
    },

    /// Pick the engine the way the calculator does (default)
    Auto {
        /// Requested mode
        #[arg(short, long, value_enum, default_value_t = CalculationMode::Auto)]
        mode: CalculationMode,

        /// Trials if the simulation runs
        #[arg(short = 'n', long, default_value = "100000")]
        trials: u64,

        /// Seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run both engines and show the difference per pattern
    Compare {
        /// Number of simulation trials
        #[arg(short = 'n', long, default_value = "200000")]
        trials: u64,

        /// Seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    generated_at: String,
    input: &'a str,
    #[serde(flatten)]
    result: &'a CalculationResult,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Logs go to stderr so --json output stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let scenario = match Scenario::from_file(&cli.input) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("✗ Failed to load scenario '{}': {}", cli.input, e);
            std::process::exit(1);
        }
    };

    let prepared = match Prepared::new(
        &scenario.deck,
        &scenario.cards,
        &scenario.patterns,
        &scenario.pot,
        &scenario.labels,
    ) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("✗ No result available: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Exact) => {
            let start = std::time::Instant::now();
            let result = exact_from_prepared(&prepared);
            report(&cli, &scenario, &result, start.elapsed());
        }
        Some(Commands::Simulate {
            trials,
            seed,
            parallel,
            chunks,
            honor_distinct,
        }) => {
            let config = SimulationConfig {
                trials,
                seed,
                honor_required_distinct: honor_distinct,
            };
            let start = std::time::Instant::now();
            let result = run_simulation(&prepared, &config, parallel.then_some(chunks));
            report(&cli, &scenario, &result, start.elapsed());
        }
        Some(Commands::Auto { mode, trials, seed }) => {
            run_auto(&cli, &scenario, &prepared, mode, trials, seed);
        }
        Some(Commands::Compare { trials, seed }) => {
            compare_engines(&scenario, &prepared, trials, seed);
        }
        None => {
            run_auto(&cli, &scenario, &prepared, CalculationMode::Auto, 100_000, None);
        }
    }
}

fn run_auto(
    cli: &Cli,
    scenario: &Scenario,
    prepared: &Prepared,
    mode: CalculationMode,
    trials: u64,
    seed: Option<u64>,
) {
    let start = std::time::Instant::now();
    let result = match select_engine(&scenario.pot, mode) {
        EngineMode::Exact => exact_from_prepared(prepared),
        EngineMode::Simulation => {
            let config = SimulationConfig {
                trials,
                seed,
                ..SimulationConfig::default()
            };
            run_simulation(prepared, &config, None)
        }
    };
    report(cli, scenario, &result, start.elapsed());
}

fn run_simulation(prepared: &Prepared, config: &SimulationConfig, chunks: Option<usize>) -> CalculationResult {
    let outcome = match chunks {
        Some(chunks) => {
            let bar = ProgressBar::new(chunks.max(1) as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} batches ({elapsed})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let outcome = compute_simulation_parallel(prepared, config, chunks, &|| bar.inc(1), None);
            bar.finish_and_clear();
            outcome
        }
        None => {
            let mut rng = GameRng::new(config.seed);
            simulate_prepared(prepared, config, &mut rng, None)
        }
    };

    match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("✗ Simulation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn report(cli: &Cli, scenario: &Scenario, result: &CalculationResult, elapsed: std::time::Duration) {
    if cli.json {
        let report = Report {
            generated_at: chrono::Utc::now().to_rfc3339(),
            input: &cli.input,
            result,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("✗ Failed to serialize result: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("\n=== Opening Hand Odds ===\n");
    println!(
        "Deck: {} cards, hand of {}",
        scenario.deck.card_count, scenario.deck.first_hand
    );
    if let Some(mode) = result.mode {
        println!("Engine: {}", mode);
    }
    println!();

    println!("Overall: {}%\n", result.overall_probability);

    println!("Patterns:");
    for entry in result.pattern_success_rates.entries() {
        let bar = "█".repeat((entry.rate.as_percent() / 2.0) as usize);
        println!("  {:30} {:>6}% {}", scenario.pattern_name(&entry.id), entry.rate, bar);
    }

    if !result.label_success_rates.is_empty() {
        println!("\nLabels:");
        for entry in result.label_success_rates.entries() {
            let bar = "█".repeat((entry.rate.as_percent() / 2.0) as usize);
            println!("  {:30} {:>6}% {}", scenario.label_name(&entry.id), entry.rate, bar);
        }
    }

    println!("\nCompleted in {:.2?}", elapsed);
}

fn compare_engines(scenario: &Scenario, prepared: &Prepared, trials: u64, seed: Option<u64>) {
    println!("\n=== Exact vs Simulation ===\n");
    println!("Trials: {}", trials);
    if let Some(s) = seed {
        println!("Seed: {}", s);
    }
    if prepared.pots.prosperity.is_some() {
        println!("Note: the exact column is a best-case bound while the cost-based pot is in the deck");
    }
    println!();

    let exact = exact_from_prepared(prepared);
    let config = SimulationConfig {
        trials,
        seed,
        ..SimulationConfig::default()
    };
    let simulated = run_simulation(prepared, &config, Some(16));

    println!("{:30} {:>9} {:>11} {:>8}", "Pattern", "Exact", "Simulated", "Delta");
    println!("{:-<61}", "");
    print_compare_row(
        "(overall)",
        exact.overall_probability.as_percent(),
        simulated.overall_probability.as_percent(),
    );
    for entry in exact.pattern_success_rates.entries() {
        let sim = simulated
            .pattern_success_rates
            .get(&entry.id)
            .map(|r| r.as_percent())
            .unwrap_or(0.0);
        print_compare_row(scenario.pattern_name(&entry.id), entry.rate.as_percent(), sim);
    }
}

fn print_compare_row(name: &str, exact: f64, simulated: f64) {
    println!(
        "{:30} {:>8.2}% {:>10.2}% {:>+7.2}",
        name,
        exact,
        simulated,
        simulated - exact
    );
}
