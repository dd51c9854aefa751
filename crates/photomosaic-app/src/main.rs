#![warn(missing_docs)]
//! # photomosaic binary
//!
//! Command-line entry point: compose a mosaic from a source image or report
//! the state of the tile library.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use photomosaic_app::logging::init_logging;
use photomosaic_app::{
    AppConfig, AppError, MosaicRequest, app_version, count_tile_files, library_status,
    load_library, parse_strategy, parse_tile_size, process_mosaic_request, write_outputs,
};
use photomosaic_render::FileTileRenderer;

#[derive(Parser)]
#[command(name = "photomosaic", version = photomosaic_app::APP_VERSION)]
#[command(about = "Rebuild images as mosaics of tile images", long_about = None)]
struct Cli {
    /// Tile image directory (overrides PHOTOMOSAIC_TILES_DIR)
    #[arg(long, global = true)]
    tiles_dir: Option<PathBuf>,

    /// Log directory (overrides PHOTOMOSAIC_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Per-request deadline in milliseconds, 0 disables it
    #[arg(long, global = true)]
    deadline_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose a mosaic from a source image
    Compose {
        /// Source image (JPEG or PNG)
        #[arg(long)]
        source: PathBuf,

        /// Output JPEG path; fan-out writes <stem>_part1..4 next to it
        #[arg(long)]
        output: PathBuf,

        /// Cell size in pixels
        #[arg(long)]
        tile_size: Option<String>,

        /// sequential, fan-out or fan-in
        #[arg(long, default_value = "fan-in")]
        strategy: String,

        /// Write the JSON response to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Report tile library status
    Library,
}

fn main() {
    let cli = Cli::parse();
    let config = apply_overrides(AppConfig::from_env(), &cli);

    let _guard = match init_logging(&config.log_dir) {
        Ok(guard) => {
            tracing::info!(path = %guard.path().display(), version = app_version(), "logging started");
            Some(guard)
        }
        Err(error) => {
            eprintln!("warning: file logging disabled: {error}");
            None
        }
    };

    if let Err(error) = dispatch(cli.command, &config) {
        tracing::error!(error = %error, "command failed");
        eprintln!("Error: {error}");
        process::exit(if error.is_client_error() { 2 } else { 1 });
    }
}

fn apply_overrides(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(dir) = &cli.tiles_dir {
        config.tiles_dir = dir.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.clone();
    }
    if let Some(millis) = cli.deadline_ms {
        config.deadline = (millis > 0).then(|| std::time::Duration::from_millis(millis));
    }
    config
}

fn dispatch(command: Command, config: &AppConfig) -> Result<(), AppError> {
    match command {
        Command::Compose {
            source,
            output,
            tile_size,
            strategy,
            report,
        } => {
            let request = MosaicRequest {
                image: fs::read(&source).map_err(|error| AppError::Io {
                    path: source.clone(),
                    source: error,
                })?,
                tile_size: tile_size.as_deref().map(parse_tile_size).transpose()?,
                strategy: parse_strategy(&strategy)?,
            };

            let holder = load_library(config)?;
            let renderer = FileTileRenderer::new();
            let completed = process_mosaic_request(&holder, &renderer, config, &request)?;

            for path in write_outputs(&output, &completed.outcome)? {
                println!("wrote {}", path.display());
            }
            if let Some(report) = report {
                let bytes = completed.to_response().to_json_bytes()?;
                fs::write(&report, bytes).map_err(|error| AppError::Io {
                    path: report.clone(),
                    source: error,
                })?;
                println!("wrote {}", report.display());
            }
            println!(
                "{} mosaic {}x{} in {:?} ({} cells, {} skipped)",
                completed.outcome.strategy,
                completed.outcome.width,
                completed.outcome.height,
                completed.duration,
                completed.outcome.cells,
                completed.outcome.skipped.len()
            );
        }
        Command::Library => {
            let files = count_tile_files(&config.tiles_dir)?;
            let holder = load_library(config)?;
            let status = library_status(&holder)?;
            println!("tiles_dir={}", config.tiles_dir.display());
            println!("files={files}");
            println!("tiles={}", status.tiles);
            println!("skipped_files={}", status.skipped_files);
            println!("fingerprint={}", status.fingerprint);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Unit tests for command-line parsing.

    use clap::CommandFactory;
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_flag_prints_build_version() {
        let error = match Cli::try_parse_from(["photomosaic", "--version"]) {
            Ok(_) => panic!("--version should short-circuit parsing"),
            Err(error) => error,
        };
        assert_eq!(error.kind(), ErrorKind::DisplayVersion);
        assert!(error.to_string().contains(app_version()));
    }

    #[test]
    fn version_is_not_a_subcommand() {
        assert!(Cli::try_parse_from(["photomosaic", "version"]).is_err());
    }

    #[test]
    fn compose_parses_with_global_overrides() {
        let cli = Cli::try_parse_from([
            "photomosaic",
            "compose",
            "--source",
            "in.png",
            "--output",
            "out.jpg",
            "--deadline-ms",
            "0",
        ])
        .expect("compose arguments should parse");

        let config = apply_overrides(AppConfig::default(), &cli);
        assert_eq!(config.deadline, None);
        assert!(matches!(cli.command, Command::Compose { ref strategy, .. } if strategy == "fan-in"));
    }
}
