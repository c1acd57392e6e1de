use std::path::Path;

use anyhow::Context;
use clap::Parser;
use ffmpeg_pipeline::{ImagesToVideo, RunReport, VideoToImages};

mod cli;

use cli::{Cli, Command};

fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .filter_module("ffmpeg_pipeline", log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn write_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    log::debug!("report written to {}", path.display());
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    ffmpeg_pipeline::init()?;
    ffmpeg_pipeline::set_ffmpeg_log_level(cli.ffmpeg_log.into());

    let report = match cli.command {
        Command::ImagesToVideo {
            src,
            dst,
            codec,
            fps,
            bit_rate,
            options,
        } => {
            let config = cli::images_to_video_config(&codec, fps, bit_rate, &options);
            ImagesToVideo::new(config).run(&src, &dst)?
        }
        Command::VideoToImages {
            src,
            out_dir,
            quality,
        } => {
            let config = cli::video_to_images_config(out_dir, quality);
            let mut pipeline = VideoToImages::jpeg(&config)?;
            pipeline.run(&src, config.out_dir.display())?
        }
        Command::Probe { src } => {
            let summary = ffmpeg_pipeline::probe(&src)?;
            print!("{}", summary);
            if let Some(path) = &cli.report {
                let json = serde_json::to_string_pretty(&summary)?;
                std::fs::write(path, json)
                    .with_context(|| format!("writing report {}", path.display()))?;
            }
            return Ok(());
        }
    };

    if let Some(path) = &cli.report {
        write_report(&report, path)?;
    }
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
