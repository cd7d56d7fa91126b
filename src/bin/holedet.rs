//! Command-line front end for the hole-detection data tools.
//!
//! # Usage
//!
//! ```bash
//! holedet split --export export.json --save-dir data/
//! holedet download --list data/download_list.txt --out-dir data/images
//! holedet build --export export.json --save-dir data/ --mode qwen3
//! holedet to-jsonl data/view.json data/view_ex.json
//! holedet check --data data/view.json --out-dir data/check_train_data
//! holedet eval --images test/ --responses responses/ --out-dir eval/
//! ```
//!
//! Set `RUST_LOG=info` to see progress.

use clap::{Parser, Subcommand};
use holedet::config::{DatasetConfig, DownloadConfig, load_config};
use holedet::dataset::build_dataset;
use holedet::dataset::prepare::{prepare_export, read_download_list};
use holedet::download::{Downloader, SchemeFetcher};
use holedet::qa::{check_training_set, evaluate};
use holedet::utils::visualization::VisualizationConfig;
use holedet_core::core::{ConfigValidator, HoleResult};
use holedet_core::processors::CoordMode;
use holedet_vl::ResponseArchive;
use holedet_vl::chat::convert_json_to_jsonl;
use holedet_vl::prompt::load_prompt;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "holedet")]
#[command(about = "Training-data preparation and QA for hole detection in drawings")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split an export and list the sheets usable for training
    Split {
        /// Label Studio JSON export
        #[arg(long)]
        export: PathBuf,
        /// Directory for label_holes.json, label_views.json and download_list.txt
        #[arg(long)]
        save_dir: PathBuf,
    },

    /// Fetch every entry of a download list
    Download {
        /// File with one URL or path per line
        #[arg(long)]
        list: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        /// Parallel workers (default: 16)
        #[arg(long)]
        workers: Option<usize>,
        /// Attempts per item (default: 3)
        #[arg(long)]
        retry: Option<usize>,
        /// File failed entries are appended to (default: failed.txt)
        #[arg(long)]
        failure_log: Option<PathBuf>,
        /// JSON download config; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Build view.json and view_ex.json from an export
    Build {
        #[arg(long)]
        export: PathBuf,
        /// Dataset directory; source sheets are read from <save-dir>/images
        #[arg(long)]
        save_dir: PathBuf,
        /// Label coordinate space: qwen3 (0-1000 grid) or qwen2 (pixels)
        #[arg(long)]
        mode: Option<CoordMode>,
        /// JSON dataset config; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
        /// Text file replacing the built-in prompt
        #[arg(long)]
        prompt: Option<PathBuf>,
    },

    /// Convert sample JSON arrays to JSONL next to the input
    ToJsonl {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Render the labels of a sample file
    Check {
        /// view.json or view_ex.json
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long, default_value = "qwen3")]
        mode: CoordMode,
        /// Font for the category labels (default: a system font)
        #[arg(long)]
        font: Option<PathBuf>,
    },

    /// Render stored detector responses for a folder of images
    Eval {
        #[arg(long)]
        images: PathBuf,
        /// Directory of <stem>.txt raw responses
        #[arg(long)]
        responses: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long, default_value = "qwen3")]
        mode: CoordMode,
        #[arg(long)]
        font: Option<PathBuf>,
        /// Text file replacing the built-in prompt
        #[arg(long)]
        prompt: Option<PathBuf>,
    },
}

fn visualization_config(font: Option<PathBuf>) -> HoleResult<VisualizationConfig> {
    match font {
        Some(path) => VisualizationConfig::with_font_path(&path),
        None => Ok(VisualizationConfig::with_system_font()),
    }
}

fn run(command: Command) -> HoleResult<()> {
    match command {
        Command::Split { export, save_dir } => {
            let prepared = prepare_export(&export, &save_dir)?;
            info!(
                "{} sheets listed in {}",
                prepared.download_list.len(),
                save_dir.display()
            );
        }
        Command::Download {
            list,
            out_dir,
            workers,
            retry,
            failure_log,
            config,
        } => {
            let mut cfg: DownloadConfig = match config {
                Some(path) => load_config(&path)?,
                None => DownloadConfig::default(),
            };
            if let Some(workers) = workers {
                cfg.workers = workers;
            }
            if let Some(retry) = retry {
                cfg.retry = retry;
            }
            if let Some(failure_log) = failure_log {
                cfg.failure_log = failure_log;
            }
            let sources = read_download_list(&list)?;
            let downloader = Downloader::new(SchemeFetcher::new()?, cfg)?;
            let report = downloader.run(&sources, &out_dir)?;
            println!("{report}");
        }
        Command::Build {
            export,
            save_dir,
            mode,
            config,
            prompt,
        } => {
            let mut cfg: DatasetConfig = match config {
                Some(path) => load_config(&path)?,
                None => DatasetConfig::default(),
            };
            if let Some(mode) = mode {
                cfg.mode = mode;
            }
            if prompt.is_some() {
                cfg.prompt_path = prompt;
            }
            cfg.validate()?;
            let set = build_dataset(&export, &save_dir, &cfg)?;
            println!("{}", set.stats);
        }
        Command::ToJsonl { files } => {
            for file in files {
                let out = convert_json_to_jsonl(&file)?;
                info!("{} -> {}", file.display(), out.display());
            }
        }
        Command::Check {
            data,
            out_dir,
            mode,
            font,
        } => {
            let vis = visualization_config(font)?;
            let report = check_training_set(&data, &out_dir, mode, &vis)?;
            println!("{report}");
        }
        Command::Eval {
            images,
            responses,
            out_dir,
            mode,
            font,
            prompt,
        } => {
            let vis = visualization_config(font)?;
            let prompt = load_prompt(prompt.as_deref())?;
            let detector = ResponseArchive::open(responses)?;
            let report = evaluate(&detector, &images, &prompt, &out_dir, mode, &vis)?;
            println!("{report}");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    holedet::utils::init_tracing();

    let args = Args::parse();
    if let Err(e) = run(args.command) {
        error!("{e}");
        return Err(e.into());
    }
    Ok(())
}
