//! PlantVillage CNN CLI
//!
//! Entry point for training, evaluating and using the 16-class leaf disease
//! classifier built with the Burn framework.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use plantvillage_cnn::backend::{backend_name, select_device, DefaultBackend, TrainingBackend};
use plantvillage_cnn::config::PipelineConfig;
use plantvillage_cnn::inference::Predictor;
use plantvillage_cnn::model::{ModelSummary, SimpleCnnConfig};
use plantvillage_cnn::pipeline::{enumerate_dataset, evaluate_saved_model, run_pipeline};
use plantvillage_cnn::utils::format_number;
use plantvillage_cnn::utils::logging::{init_logging, LogConfig, LogLevel};

/// PlantVillage leaf disease classification
///
/// Trains a small CNN on the train/validation/test image folders, evaluates
/// it on the test split and writes charts and reports for the run.
#[derive(Parser, Debug)]
#[command(name = "plantvillage_cnn")]
#[command(version)]
#[command(about = "Leaf disease CNN training and evaluation with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false", conflicts_with = "verbose")]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// TOML configuration file (defaults are used for missing keys)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the configuration file
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Dataset root holding train/, validation/ and test/
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Base path of the model artifact
    #[arg(short, long)]
    model_path: Option<PathBuf>,

    /// Directory under which run directories are created
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// Batch size for training and prediction
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// GPU index used when the GPU backend is available
    #[arg(long)]
    gpu: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train, save, evaluate and report (the full pipeline)
    Train {
        #[command(flatten)]
        overrides: Overrides,

        /// Number of training epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Adam learning rate
        #[arg(short, long)]
        learning_rate: Option<f64>,

        /// Random seed for shuffling
        #[arg(long)]
        seed: Option<u64>,

        /// Keep the training split in directory order
        #[arg(long, default_value = "false")]
        no_shuffle: bool,
    },

    /// Show per-directory image counts for every split
    Stats {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Evaluate a saved model on the test split
    Evaluate {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the model layer summary
    Summary {
        /// Input image size (square)
        #[arg(long)]
        image_size: Option<usize>,
    },

    /// Classify a single image or every image in a directory
    Infer {
        /// Path to input image or directory
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Number of classes to show per image
        #[arg(short, long, default_value = "3")]
        top_k: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = if cli.verbose {
        LogConfig::verbose()
    } else if cli.quiet {
        LogConfig::quiet()
    } else {
        LogConfig::default()
    };
    if let Some(level) = &cli.log_level {
        log_config.level = LogLevel::parse(level);
    }
    let _ = init_logging(&log_config);

    print_banner();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Train {
            overrides,
            epochs,
            learning_rate,
            seed,
            no_shuffle,
        } => {
            apply_overrides(&mut config, &overrides);
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            if let Some(lr) = learning_rate {
                config.training.learning_rate = lr;
            }
            if let Some(seed) = seed {
                config.training.seed = seed;
            }
            if no_shuffle {
                config.data.shuffle_train = false;
            }
            cmd_train(&config)?;
        }
        Commands::Stats { overrides } => {
            apply_overrides(&mut config, &overrides);
            cmd_stats(&config.data.data_dir)?;
        }
        Commands::Evaluate { overrides } => {
            apply_overrides(&mut config, &overrides);
            cmd_evaluate(&config)?;
        }
        Commands::Summary { image_size } => {
            cmd_summary(image_size.unwrap_or(config.data.image_size));
        }
        Commands::Infer {
            input,
            overrides,
            top_k,
        } => {
            apply_overrides(&mut config, &overrides);
            cmd_infer(&config, &input, top_k)?;
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut PipelineConfig, overrides: &Overrides) {
    if let Some(dir) = &overrides.data_dir {
        config.data.data_dir = dir.clone();
    }
    if let Some(path) = &overrides.model_path {
        config.output.model_path = path.clone();
    }
    if let Some(dir) = &overrides.logs_dir {
        config.output.logs_root = dir.clone();
    }
    if let Some(batch_size) = overrides.batch_size {
        config.training.batch_size = batch_size;
    }
    if let Some(gpu) = overrides.gpu {
        config.device.gpu_index = gpu;
    }
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════════════════════╗
 ║   🌱 PlantVillage CNN                                        ║
 ║   Leaf Disease Classification with Burn + Rust               ║
 ╚══════════════════════════════════════════════════════════════╝
"#
        .green()
    );
}

fn cmd_train(config: &PipelineConfig) -> Result<()> {
    config.validate()?;
    println!("{}", "Initializing Training...".green().bold());
    println!("  🧠 Backend: {}", backend_name());
    println!("  📂 Data:    {}", config.data.data_dir.display());
    println!();

    let device = select_device(&config.device);
    let outcome = run_pipeline::<TrainingBackend>(config, &device).context("Training pipeline failed")?;

    info!("Run artifacts in {}", outcome.run_dir.display());
    println!();
    println!("{}", "Next steps:".cyan().bold());
    println!(
        "  • Evaluate again: plantvillage_cnn evaluate --model-path {}",
        outcome.model_path.display()
    );
    println!(
        "  • Run inference:  plantvillage_cnn infer --model-path {} --input <image>",
        outcome.model_path.display()
    );
    Ok(())
}

fn cmd_stats(data_dir: &Path) -> Result<()> {
    let splits = enumerate_dataset(data_dir)
        .with_context(|| format!("Failed to enumerate dataset at {}", data_dir.display()))?;

    println!();
    println!("{}", "Split Totals:".cyan().bold());
    for split in &splits {
        println!("  {:<12} {:>8}", split.kind.to_string(), format_number(split.total_files));
    }
    let total: usize = splits.iter().map(|s| s.total_files).sum();
    println!("  {:<12} {:>8}", "all", format_number(total));
    Ok(())
}

fn cmd_evaluate(config: &PipelineConfig) -> Result<()> {
    println!("{}", "Evaluating Saved Model...".green().bold());
    println!("  📦 Model: {}", config.output.model_path.display());

    let device = select_device(&config.device);
    let (output_dir, evaluation) =
        evaluate_saved_model::<DefaultBackend>(config, &device).context("Evaluation failed")?;

    println!();
    println!("  🎯 Test accuracy: {:.2}%", evaluation.accuracy * 100.0);
    println!("  📁 Reports:       {}", output_dir.display());
    Ok(())
}

fn cmd_summary(image_size: usize) {
    let summary = ModelSummary::from_config(&SimpleCnnConfig::new().with_image_size(image_size));
    println!("{}", "Model Summary:".cyan().bold());
    println!("{summary}");
}

fn cmd_infer(config: &PipelineConfig, input: &Path, top_k: usize) -> Result<()> {
    let device = select_device(&config.device);
    let predictor = Predictor::<DefaultBackend>::load(&config.output.model_path, device)
        .with_context(|| format!("Failed to load model {}", config.output.model_path.display()))?
        .with_top_k(top_k);

    let results = predictor.predict_path(input)?;
    println!("{}", "Predictions:".cyan().bold());
    for result in &results {
        let name = result
            .image_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "  {} → {} ({:.1}%, {:.1} ms)",
            name,
            result.class_name.green().bold(),
            result.confidence * 100.0,
            result.inference_time_ms
        );
        for (idx, class, prob) in result.top_k.iter().skip(1) {
            println!("      {:>2} {:<45} {:.1}%", idx, class, prob * 100.0);
        }
    }
    println!("  {} image(s) classified", results.len());
    Ok(())
}
