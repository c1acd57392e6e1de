//! Ties a codec driver to the elementary stream it reads from or writes to.

use ffmpeg_next::{Dictionary, format::Pixel};

use crate::{
    decoder::Decoder,
    encoder::{Encoder, EncoderConfig},
    input::AvInput,
    output::AvOutput,
    stream::AvStream,
};

/// An input video stream and the decoder reading it.
pub struct InputBinding {
    stream: AvStream,
    decoder: Decoder,
}

impl InputBinding {
    pub fn new(stream: &AvStream) -> anyhow::Result<Self> {
        let decoder = Decoder::new(stream)?;
        Ok(Self {
            stream: stream.clone(),
            decoder,
        })
    }

    /// Binds the best video stream of `input`; `None` when it has no video.
    pub fn best_video(input: &AvInput) -> anyhow::Result<Option<Self>> {
        match input.best_video_stream() {
            Some(stream) => Ok(Some(Self::new(stream)?)),
            None => Ok(None),
        }
    }

    pub fn index(&self) -> usize {
        self.stream.index()
    }

    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    pub fn format(&self) -> Pixel {
        self.decoder.format()
    }

    pub fn decoder_mut(&mut self) -> &mut Decoder {
        &mut self.decoder
    }
}

/// An output video stream and the encoder feeding it.
///
/// Codec parameters are negotiated once, here, before the encoder is opened:
/// the container decides the global-header flag, the config supplies the rest.
pub struct OutputBinding {
    index: usize,
    encoder: Encoder,
}

impl OutputBinding {
    pub fn open(
        output: &mut AvOutput,
        mut config: EncoderConfig,
        options: Option<Dictionary>,
    ) -> anyhow::Result<Self> {
        config.global_header = output.requires_global_header();
        let encoder = Encoder::new(config, options)?;
        let index = output.add_video_stream(
            &encoder.config().codec,
            encoder.parameters(),
            encoder.config().time_base,
            encoder.config().frame_rate,
        )?;
        log::info!(
            "output stream {} bound to {} ({}x{} @ {})",
            index,
            encoder.config().codec,
            encoder.config().width,
            encoder.config().height,
            encoder.config().frame_rate
        );
        Ok(Self { index, encoder })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.encoder.config().width
    }

    pub fn height(&self) -> u32 {
        self.encoder.config().height
    }

    pub fn format(&self) -> Pixel {
        self.encoder.config().pixel_format
    }

    pub fn encoder_mut(&mut self) -> &mut Encoder {
        &mut self.encoder
    }
}
