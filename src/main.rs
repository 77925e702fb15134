//! Baseball Lineup Optimizer CLI
//!
//! Fetches Statcast data, trains the hit-probability model, and ranks a
//! batting lineup against a named pitcher.

use clap::{Parser, Subcommand};
use lineup::{Config, Result};

#[derive(Parser)]
#[command(name = "lineup")]
#[command(about = "Baseball lineup optimization using a neural hit-probability model", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Train the hit-probability model
    Train {
        /// Override number of epochs
        #[arg(long)]
        epochs: Option<usize>,
        /// Learning rate
        #[arg(long)]
        lr: Option<f64>,
    },
    /// Rank a batting lineup against a pitcher
    Optimize {
        /// Pitcher name, e.g. "Gerrit Cole" (prompted when omitted)
        pitcher: Option<String>,
        /// Comma-separated batter names (prompted when omitted)
        batters: Option<String>,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Fetch the Statcast snapshot (uses the cache when present)
    Fetch {
        /// Use only the cached file (no network requests)
        #[arg(long)]
        offline: bool,
    },
    /// Show snapshot and artifact status
    Status,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Fetch { offline } => commands::data_fetch(&config, offline),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Train { epochs, lr } => commands::train(&config, epochs, lr),
        Commands::Optimize { pitcher, batters } => commands::optimize(&config, pitcher, batters),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use lineup::data::statcast::load_snapshot;
    use lineup::data::{ChadwickLookup, HitDataset, StatcastClient};
    use lineup::features::ProfileStore;
    use lineup::predict::optimizer::format_lineup;
    use lineup::predict::LineupOptimizer;
    use std::collections::HashSet;
    use std::io::Write;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'lineup data fetch' to fetch Statcast data");
        println!("  3. Run 'lineup train' to train the model");
        println!("  4. Run 'lineup optimize \"Gerrit Cole\" \"Aaron Judge, Juan Soto\"'");

        Ok(())
    }

    pub fn data_fetch(config: &Config, offline: bool) -> Result<()> {
        let client = StatcastClient::new().offline_only(offline);
        let events = client.fetch(
            &config.data.statcast_cache,
            &config.data.start_date,
            &config.data.end_date,
        )?;
        println!("Fetched {} pitch events", events.len());
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        println!("Data Status");
        println!("───────────────────────────────");
        println!("  Snapshot:  {}", config.data.statcast_cache);

        match load_snapshot(&config.data.statcast_cache) {
            Ok(events) => {
                let batters: HashSet<_> = events.iter().map(|e| e.batter).collect();
                let pitchers: HashSet<_> = events.iter().map(|e| e.pitcher).collect();
                println!("  Rows:      {}", events.len());
                println!("  Batters:   {}", batters.len());
                println!("  Pitchers:  {}", pitchers.len());
            }
            Err(_) => println!("  Rows:      (not fetched)"),
        }

        let model_file = format!("{}.mpk", config.data.model_path);
        let model_ok = std::path::Path::new(&model_file).exists();
        let scaler_ok = std::path::Path::new(&config.data.scaler_path).exists();
        println!("  Model:     {}", if model_ok { "present" } else { "missing" });
        println!("  Scaler:    {}", if scaler_ok { "present" } else { "missing" });

        Ok(())
    }

    pub fn train(config: &Config, epochs: Option<usize>, lr: Option<f64>) -> Result<()> {
        use burn::backend::{Autodiff, NdArray};
        use lineup::model::{HitNet, HitNetConfig};
        use lineup::training::HitTrainer;

        type MyBackend = NdArray<f32>;
        type MyAutodiffBackend = Autodiff<MyBackend>;

        let epochs = epochs.unwrap_or(config.training.epochs);
        let lr = lr.unwrap_or(config.training.learning_rate);

        println!("Loading Statcast snapshot...");
        let history = load_snapshot(&config.data.statcast_cache)?;
        println!("Loaded {} pitch events", history.len());

        // Derive batter aggregates and persist the re-derivable stats file
        let store = ProfileStore::new(
            history,
            Box::new(ChadwickLookup::empty()),
            config.fallback.clone(),
        );
        store.write_batter_stats(&config.data.batter_stats_path)?;
        println!(
            "Wrote aggregates for {} batters to {}",
            store.batter_aggregates().len(),
            config.data.batter_stats_path
        );

        let dataset = HitDataset::from_history(store.history(), store.batter_aggregates());
        if dataset.is_empty() {
            return Err(lineup::LineupError::Config(
                "No usable training rows in the snapshot".to_string(),
            ));
        }
        println!(
            "Built {} training samples (hit rate {:.3})",
            dataset.len(),
            dataset.hit_rate()
        );

        let (train_set, test_set) =
            dataset.split(config.training.test_fraction, config.training.seed);

        let device = Default::default();
        let net_config = HitNetConfig {
            input_dim: lineup::features::MatchupFeatures::DIM,
            hidden_dims: config.training.hidden_dims.clone(),
            dropout: config.training.dropout,
        };
        let model = HitNet::<MyAutodiffBackend>::new(&device, net_config);
        let trainer = HitTrainer::new(model, lr, device);

        println!("\nStarting training ({} epochs, lr={})...\n", epochs, lr);
        let (trained_model, scaler, history) = trainer.train(
            &train_set,
            &test_set,
            epochs,
            config.training.early_stopping_patience,
        )?;

        // The two artifacts are only useful together
        if let Some(parent) = std::path::Path::new(&config.data.model_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        trained_model.save(&config.data.model_path)?;
        scaler.save(&config.data.scaler_path)?;

        println!("\nTraining complete!");
        println!("  Best epoch:    {}", history.best_epoch + 1);
        println!("  Best test loss: {:.4}", history.best_test_loss);
        println!(
            "  Test accuracy: {:.1}%",
            history.test_accuracies.last().unwrap_or(&0.0) * 100.0
        );
        println!("  Model saved to {}.mpk", config.data.model_path);
        println!("  Scaler saved to {}", config.data.scaler_path);

        Ok(())
    }

    pub fn optimize(
        config: &Config,
        pitcher: Option<String>,
        batters: Option<String>,
    ) -> Result<()> {
        use burn::backend::NdArray;

        type MyBackend = NdArray<f32>;

        println!("Welcome to the Baseball Lineup Optimizer!");

        let pitcher = match pitcher {
            Some(p) => p,
            None => prompt("Enter Pitcher Name (e.g. Gerrit Cole): ")?,
        };
        let batters_input = match batters {
            Some(b) => b,
            None => prompt("Enter Batter Names (comma separated, e.g. Aaron Judge, Juan Soto): ")?,
        };
        let batter_names: Vec<String> = batters_input
            .split(',')
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();

        println!("\nOptimizing lineup against {}...", pitcher);

        // Optimizer failures are reported as one error line; the process
        // still exits normally.
        match run_optimizer::<MyBackend>(config, &pitcher, &batter_names) {
            Ok(ranked) => {
                println!();
                print!("{}", format_lineup(&ranked));
            }
            Err(e) => println!("Error: {}", e),
        }

        Ok(())
    }

    fn run_optimizer<B>(
        config: &Config,
        pitcher: &str,
        batter_names: &[String],
    ) -> Result<Vec<lineup::MatchupPrediction>>
    where
        B: burn::tensor::backend::Backend,
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let history = load_snapshot(&config.data.statcast_cache)?;

        // Name resolution is best-effort: without a register every lookup
        // falls back, but the lineup still scores.
        let lookup = match ChadwickLookup::load_or_fetch(&config.data.register_cache) {
            Ok(l) => l,
            Err(e) => {
                log::warn!("Player register unavailable ({}); using fallback profiles", e);
                ChadwickLookup::empty()
            }
        };

        let store = ProfileStore::new(history, Box::new(lookup), config.fallback.clone());
        let device = Default::default();
        let optimizer = LineupOptimizer::<B>::load(config, store, device)?;
        optimizer.optimize(pitcher, batter_names)
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let model_file = format!("{}.mpk", config.data.model_path);
        if !std::path::Path::new(&model_file).exists()
            || !std::path::Path::new(&config.data.scaler_path).exists()
        {
            return Err(lineup::LineupError::MissingArtifacts);
        }

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Weights:     {}", model_file);
        println!("  Scaler:      {}", config.data.scaler_path);
        println!("  Input dim:   {}", lineup::features::MatchupFeatures::DIM);
        println!("  Hidden dims: {:?}", config.training.hidden_dims);
        println!("  Dropout:     {}", config.training.dropout);

        Ok(())
    }

    fn prompt(message: &str) -> Result<String> {
        print!("{}", message);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}
