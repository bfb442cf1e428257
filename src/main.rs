use clap::{CommandFactory, Parser};
use mapset_organizer::cli::{OrganizeOptions, run_cli_with_config};
use mapset_organizer::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Split an osu! mapset folder into one folder per difficulty.
#[derive(Debug, Parser)]
#[command(name = "mapset-organizer", version, about)]
struct Args {
    /// Folder containing the .osu difficulty files and their assets
    mapset_dir: Option<PathBuf>,

    /// Show what would be created and copied without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Configuration file (defaults to .mapsetrc.toml or ~/.config/mapset-organizer/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a JSON report of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let Some(mapset_dir) = args.mapset_dir else {
        // No folder given: show usage and stop without signalling an error
        let _ = Args::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    };

    let options = OrganizeOptions {
        dry_run: args.dry_run,
        report_path: args.report,
    };

    match run_cli_with_config(&mapset_dir, &options, args.config.as_deref()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
