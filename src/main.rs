use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug, warn};

mod cli;
mod cropdetect;
mod error;
mod ffmpeg;
mod filters;
mod pipeline;
mod progress;

use cli::Cli;
use ffmpeg::{FFMPEG, GIFSICLE};
use pipeline::Stage;
use progress::PipelineUi;

fn main() {
    let cli = Cli::parse();
    init_logger(cli.quiet, cli.verbose);

    if let Err(err) = run(cli) {
        // error reporting bypasses the logger so a fatal run never exits
        // silently, quiet or not
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logger(quiet: bool, verbose: bool) {
    let level = if quiet {
        LevelFilter::Off
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let tools = ffmpeg::resolve_tools()?;
    let mut cfg = cli.into_config()?;

    if cfg.optimize && tools.gifsicle.is_none() {
        warn!("{GIFSICLE} not found in PATH, skipping optimization");
        cfg.optimize = false;
    }

    if cfg.crop_detect {
        cfg.detected_crop = cropdetect::detect_crop(&tools, &cfg)?;
        match &cfg.detected_crop {
            Some(token) => debug!("detected crop region {token}"),
            None => debug!("no crop region detected, keeping manual crop settings"),
        }
    }

    let filter_expr = filters::filter_complex(&cfg);
    let transcode = ffmpeg::transcode_args(&cfg, &filter_expr);
    debug!("transcode: {}", ffmpeg::shell_preview(FFMPEG, &transcode));

    let mut stages = vec![Stage {
        name: FFMPEG,
        command: ffmpeg::command(&tools.ffmpeg, &transcode),
    }];
    if cfg.optimize {
        if let Some(gifsicle) = &tools.gifsicle {
            let optimize = ffmpeg::optimizer_args(&cfg);
            debug!("optimize: {}", ffmpeg::shell_preview(GIFSICLE, &optimize));
            stages.push(Stage {
                name: GIFSICLE,
                command: ffmpeg::command(gifsicle, &optimize),
            });
        }
    }

    let ui = PipelineUi::start(!cfg.quiet && !cfg.verbose, cfg.optimize);
    match pipeline::run(stages, cfg.verbose) {
        Ok(()) => {
            ui.finish(&cfg.output);
            Ok(())
        }
        Err(err) => {
            ui.clear();
            Err(err)
        }
    }
}
