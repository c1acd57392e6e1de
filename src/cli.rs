use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ffmpeg_pipeline::{ImagesToVideoConfig, VideoToImagesConfig, encoder::EncoderConfig};

/// Still images to video and back, through FFmpeg.
#[derive(Parser, Debug)]
#[command(name = "media-transcode", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Write the run report as JSON to this file.
    #[arg(long, global = true)]
    pub report: Option<PathBuf>,

    /// FFmpeg's own log verbosity.
    #[arg(long, global = true, value_enum, default_value = "error")]
    pub ffmpeg_log: FfmpegLog,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode every .jpg/.jpeg/.png in a directory, by file name, into one video.
    ImagesToVideo {
        /// Directory holding the source images.
        #[arg(long)]
        src: PathBuf,

        /// Output container; the format follows the extension.
        #[arg(long)]
        dst: PathBuf,

        /// FFmpeg encoder name.
        #[arg(long, default_value = "libx264")]
        codec: String,

        #[arg(long, default_value = "25", value_parser = clap::value_parser!(i32).range(1..=240))]
        fps: i32,

        /// Target bit rate in bits per second (codec default if omitted).
        #[arg(long)]
        bit_rate: Option<usize>,

        /// Codec private option as key=value, repeatable.
        #[arg(long = "opt", value_parser = parse_key_value)]
        options: Vec<(String, String)>,
    },
    /// Decode the best video stream of a file into numbered JPEGs.
    VideoToImages {
        #[arg(long)]
        src: PathBuf,

        #[arg(long, default_value = "tmp")]
        out_dir: PathBuf,

        #[arg(long, default_value = "80", value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },
    /// Print what a media file holds.
    Probe {
        #[arg(long)]
        src: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FfmpegLog {
    Quiet,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
}

impl From<FfmpegLog> for ffmpeg_next::util::log::Level {
    fn from(level: FfmpegLog) -> Self {
        use ffmpeg_next::util::log::Level;
        match level {
            FfmpegLog::Quiet => Level::Quiet,
            FfmpegLog::Error => Level::Error,
            FfmpegLog::Warning => Level::Warning,
            FfmpegLog::Info => Level::Info,
            FfmpegLog::Verbose => Level::Verbose,
            FfmpegLog::Debug => Level::Debug,
        }
    }
}

pub fn images_to_video_config(
    codec: &str,
    fps: i32,
    bit_rate: Option<usize>,
    options: &[(String, String)],
) -> ImagesToVideoConfig {
    let mut encoder = EncoderConfig {
        codec: codec.to_string(),
        bit_rate,
        options: options.to_vec(),
        ..EncoderConfig::default()
    }
    .with_fps(fps);
    if !encoder.codec.contains("264") {
        encoder.profile = None;
    }
    ImagesToVideoConfig {
        encoder,
        size: None,
    }
}

pub fn video_to_images_config(out_dir: PathBuf, quality: u8) -> VideoToImagesConfig {
    VideoToImagesConfig { out_dir, quality }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::Rational;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from([
            "media-transcode",
            "images-to-video",
            "--src",
            "frames",
            "--dst",
            "out.mp4",
        ])
        .unwrap();
        let Command::ImagesToVideo {
            codec,
            fps,
            bit_rate,
            options,
            ..
        } = cli.command
        else {
            panic!("wrong subcommand");
        };
        assert_eq!(codec, "libx264");
        assert_eq!(fps, 25);
        assert!(bit_rate.is_none());
        assert!(options.is_empty());
        assert!(cli.report.is_none());
    }

    #[test]
    fn test_video_to_images_defaults() {
        let cli =
            Cli::try_parse_from(["media-transcode", "video-to-images", "--src", "in.mp4"]).unwrap();
        let Command::VideoToImages {
            out_dir, quality, ..
        } = cli.command
        else {
            panic!("wrong subcommand");
        };
        assert_eq!(out_dir, PathBuf::from("tmp"));
        assert_eq!(quality, 80);
    }

    #[test]
    fn test_rejects_bad_quality() {
        assert!(
            Cli::try_parse_from([
                "media-transcode",
                "video-to-images",
                "--src",
                "in.mp4",
                "--quality",
                "0"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_encoder_mapping() {
        let config = images_to_video_config(
            "libx264",
            30,
            Some(2_000_000),
            &[("preset".to_string(), "fast".to_string())],
        );
        assert_eq!(config.encoder.time_base, Rational::new(1, 30));
        assert_eq!(config.encoder.frame_rate, Rational::new(30, 1));
        assert_eq!(config.encoder.bit_rate, Some(2_000_000));
        assert!(config.encoder.profile.is_some());
        assert_eq!(config.encoder.options.len(), 1);

        let config = images_to_video_config("mpeg4", 25, None, &[]);
        assert!(config.encoder.profile.is_none());
    }

    #[test]
    fn test_key_value() {
        assert_eq!(
            parse_key_value("crf=23").unwrap(),
            ("crf".to_string(), "23".to_string())
        );
        assert!(parse_key_value("crf").is_err());
        assert!(parse_key_value("=1").is_err());
    }
}
