use clap::Parser;

use music_convert::cli::commands::Cli;
use music_convert::{convert_directory, ConversionOptions, FfmpegTool};

fn main() {
    let cli = Cli::parse();

    // --verbose surfaces the debug channel (ffmpeg command lines, rename
    // reasons, deletions); RUST_LOG still overrides.
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let options = ConversionOptions {
        dry_run: cli.dry_run,
        keep_original: cli.keep_original,
        verbose: cli.verbose,
    };

    let tool = FfmpegTool::new();
    match convert_directory(&tool, &cli.directory, &options) {
        Ok(summary) => {
            let exit_code = if summary.failed.is_empty() { 0 } else { 1 };
            std::process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
