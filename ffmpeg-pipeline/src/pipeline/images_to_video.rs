use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;

use crate::{
    binding::{InputBinding, OutputBinding},
    encoder::EncoderConfig,
    error::PipelineError,
    frame::RawVideoFrame,
    input::AvInput,
    output::{AvOutput, PacketSink},
    scaler::ScalerConfig,
    source,
};

use super::{
    encode::{drain, encode_frame},
    report::RunReport,
    state::PipelineState,
};

#[derive(Debug, Clone, Default)]
pub struct ImagesToVideoConfig {
    /// Codec, pixel format, frame rate and bit rate of the output stream.
    /// Width and height are overwritten at run time.
    pub encoder: EncoderConfig,
    /// Output size. `None` keeps the size of the first source image.
    pub size: Option<(u32, u32)>,
}

/// Encodes a set of still images, in order, into one video stream.
pub struct ImagesToVideo {
    config: ImagesToVideoConfig,
}

impl ImagesToVideo {
    pub fn new(config: ImagesToVideoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImagesToVideoConfig {
        &self.config
    }

    /// Encodes every eligible image in `src_dir` into `dst`.
    pub fn run(&self, src_dir: &Path, dst: &Path) -> anyhow::Result<RunReport> {
        let sources = source::scan_images(src_dir)?;
        let mut report = self.run_files(&sources, dst)?;
        report.source = src_dir.display().to_string();
        Ok(report)
    }

    /// Encodes `sources` in the given order into `dst`. Nothing is created
    /// when `sources` is empty.
    pub fn run_files(&self, sources: &[PathBuf], dst: &Path) -> anyhow::Result<RunReport> {
        if sources.is_empty() {
            return Err(PipelineError::NoSources(PathBuf::new()).into());
        }

        let started = Instant::now();
        let mut report = RunReport::new(
            "images-to-video",
            format!("{} files", sources.len()),
            dst.display(),
        );
        let mut output = AvOutput::create(dst)?;
        let mut state = PipelineState::new();
        let mut binding: Option<OutputBinding> = None;

        for path in sources {
            log::info!("Loading {}", path.display());
            let frame = decode_picture(path)
                .with_context(|| format!("decoding {}", path.display()))?;
            report.inputs += 1;
            report.frames_decoded += 1;

            if binding.is_none() {
                let (width, height) = self
                    .config
                    .size
                    .unwrap_or((frame.width(), frame.height()));
                let config = self.config.encoder.clone().with_size(width, height);
                let opened = OutputBinding::open(&mut output, config, None)?;
                output.write_header()?;
                binding = Some(opened);
            }
            let binding = binding
                .as_mut()
                .ok_or_else(|| PipelineError::InvalidState("output not bound".to_string()))?;

            let scaled = state
                .scaler_mut()
                .get_or_init(|| {
                    ScalerConfig::to_geometry(
                        &frame,
                        binding.width(),
                        binding.height(),
                        binding.format(),
                    )
                })?
                .convert(&frame)
                .with_context(|| format!("converting {}", path.display()))?;
            drop(frame);

            let index = binding.index();
            report.packets_written +=
                encode_frame(&mut state, binding.encoder_mut(), &mut output, index, scaled)?;
            report.frames_encoded += 1;
        }

        if let Some(mut binding) = binding {
            let index = binding.index();
            report.packets_drained = drain(&mut state, binding.encoder_mut(), &mut output, index)?;
        }
        output.write_trailer()?;

        report.final_pts = state.pts();
        report.finish(started);
        log::info!(
            "{}: {} frames, {} packets",
            dst.display(),
            report.frames_encoded,
            report.total_packets()
        );
        log::info!("{}", report);
        Ok(report)
    }
}

/// Decodes the single picture of an image file.
fn decode_picture(path: &Path) -> anyhow::Result<RawVideoFrame> {
    let mut input = AvInput::open(path)?;
    let mut binding = InputBinding::best_video(&input)?
        .ok_or_else(|| PipelineError::NoVideoStream(path.to_path_buf()))?;

    loop {
        match input.read_packet()? {
            Some(packet) if packet.index() == binding.index() => {
                return binding.decoder_mut().decode_single(packet);
            }
            Some(_) => continue,
            None => {
                return Err(PipelineError::InvalidState(format!(
                    "{} holds no picture data",
                    path.display()
                ))
                .into());
            }
        }
    }
}
