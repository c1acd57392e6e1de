use ffmpeg_next::{Dictionary, Rational, codec::Parameters, format::Pixel};

use crate::{
    codec::CodecState, error::PipelineError, error::is_again, frame::RawVideoFrame,
    packet::RawPacket,
};

/// Outcome of one encode call.
pub enum Encoded {
    Packets(Vec<RawPacket>),
    /// The codec buffered the frames and has nothing to emit yet.
    NeedMoreInput,
    /// Every buffered packet has been returned; the encoder is closed.
    EndOfStream,
}

impl Encoded {
    pub fn into_packets(self) -> Vec<RawPacket> {
        match self {
            Encoded::Packets(packets) => packets,
            Encoded::NeedMoreInput | Encoded::EndOfStream => Vec::new(),
        }
    }
}

/// H.264 profiles understood by `EncoderConfig::profile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Baseline,
    Main,
    High,
}

impl Profile {
    /// `AVCodecContext.profile` value.
    pub fn as_raw(self) -> i32 {
        match self {
            Profile::Baseline => 66,
            Profile::Main => 77,
            Profile::High => 100,
        }
    }
}

/// Everything negotiated before an encoder is opened. Fixed afterwards.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Encoder name as known to FFmpeg, e.g. "libx264", "mpeg4".
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub pixel_format: Pixel,
    /// Unit of the pts assigned to frames fed to the encoder.
    pub time_base: Rational,
    pub frame_rate: Rational,
    /// Only meaningful for H.264 encoders.
    pub profile: Option<Profile>,
    /// Target bits per second; codec default when `None`.
    pub bit_rate: Option<usize>,
    /// Emit codec extradata out of band. Set when the container asks for it.
    pub global_header: bool,
    /// Codec private options passed at open time, e.g. `("preset", "fast")`.
    pub options: Vec<(String, String)>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            width: 0,
            height: 0,
            pixel_format: Pixel::YUV420P,
            time_base: Rational::new(1, 25),
            frame_rate: Rational::new(25, 1),
            profile: Some(Profile::Main),
            bit_rate: None,
            global_header: false,
            options: Vec::new(),
        }
    }
}

impl EncoderConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Constant frame rate of `fps`, one tick per frame.
    pub fn with_fps(mut self, fps: i32) -> Self {
        self.time_base = Rational::new(1, fps);
        self.frame_rate = Rational::new(fps, 1);
        self
    }
}

/// Video encoder for one output stream.
pub struct Encoder {
    config: EncoderConfig,
    inner: ffmpeg_next::codec::encoder::Video,
    encoder_time_base: Rational,
    state: CodecState,
}

impl Encoder {
    pub fn new(config: EncoderConfig, options: Option<Dictionary>) -> anyhow::Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(PipelineError::allocation(
                "encoder",
                format!("invalid size {}x{}", config.width, config.height),
            )
            .into());
        }

        let codec = ffmpeg_next::encoder::find_by_name(&config.codec).ok_or_else(|| {
            PipelineError::allocation("encoder", format!("codec not found: {}", config.codec))
        })?;
        let ctx = ffmpeg_next::codec::Context::new_with_codec(codec);
        let mut encoder = ctx
            .encoder()
            .video()
            .map_err(|e| PipelineError::allocation("encoder", e.to_string()))?;

        encoder.set_width(config.width);
        encoder.set_height(config.height);
        encoder.set_format(config.pixel_format);
        encoder.set_time_base(config.time_base);
        encoder.set_frame_rate(Some(config.frame_rate));
        if let Some(bit_rate) = config.bit_rate {
            encoder.set_bit_rate(bit_rate);
        }
        if config.global_header {
            encoder.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        if codec
            .capabilities()
            .contains(ffmpeg_next::codec::Capabilities::EXPERIMENTAL)
        {
            log::info!("{} is experimental, relaxing compliance", config.codec);
            encoder.compliance(ffmpeg_next::codec::Compliance::Experimental);
        }
        if let Some(profile) = config.profile {
            unsafe {
                (*encoder.as_mut_ptr()).profile = profile.as_raw();
            }
        }

        let mut options = options.unwrap_or_default();
        for (key, value) in &config.options {
            options.set(key, value);
        }
        let encoder = encoder
            .open_with(options)
            .map_err(|e| {
                PipelineError::allocation("encoder", format!("open {}: {}", config.codec, e))
            })?;
        let encoder_time_base: Rational = unsafe { (*encoder.0.as_ptr()).time_base.into() };
        log::info!(
            "encoder opened: {} {:?} {}x{}, time base {}",
            config.codec,
            config.pixel_format,
            config.width,
            config.height,
            encoder_time_base
        );

        Ok(Self {
            config,
            inner: encoder,
            encoder_time_base,
            state: CodecState::Open,
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Time base of the pts/dts on emitted packets, as chosen by the codec.
    pub fn time_base(&self) -> Rational {
        self.encoder_time_base
    }

    pub fn state(&self) -> CodecState {
        self.state
    }

    /// Codec parameters to copy onto the container stream.
    pub fn parameters(&self) -> Parameters {
        Parameters::from(&self.inner)
    }

    /// Feeds `frames` (or, with `drain`, asks the codec to flush) and returns
    /// every packet available afterwards.
    ///
    /// A drain request must come with no frames. The first one sends end of
    /// input to the codec; later ones keep collecting until the codec reports
    /// end of stream, after which they return [`Encoded::EndOfStream`].
    pub fn encode(&mut self, frames: Vec<RawVideoFrame>, drain: bool) -> anyhow::Result<Encoded> {
        let mut packets = Vec::new();

        if drain {
            if !frames.is_empty() {
                return Err(PipelineError::InvalidState(format!(
                    "drain request carries {} frames",
                    frames.len()
                ))
                .into());
            }
            if self.state.is_closed() {
                return Ok(Encoded::EndOfStream);
            }
            if self.state.begin_drain() {
                self.inner
                    .send_eof()
                    .map_err(|e| PipelineError::codec("encode", e))?;
            }
            self.receive_packets(&mut packets)?;
        } else {
            self.state.feed("encode")?;
            for frame in frames {
                self.check_geometry(&frame)?;
                self.inner
                    .send_frame(frame.as_video())
                    .map_err(|e| PipelineError::codec("encode", e))?;
                self.receive_packets(&mut packets)?;
            }
        }

        if !packets.is_empty() {
            Ok(Encoded::Packets(packets))
        } else if self.state.is_closed() {
            Ok(Encoded::EndOfStream)
        } else {
            Ok(Encoded::NeedMoreInput)
        }
    }

    fn check_geometry(&self, frame: &RawVideoFrame) -> Result<(), PipelineError> {
        if frame.width() != self.config.width
            || frame.height() != self.config.height
            || frame.format() != self.config.pixel_format
        {
            return Err(PipelineError::Conversion(format!(
                "frame {:?} {}x{} does not match encoder {:?} {}x{}",
                frame.format(),
                frame.width(),
                frame.height(),
                self.config.pixel_format,
                self.config.width,
                self.config.height
            )));
        }
        Ok(())
    }

    fn receive_packets(&mut self, out: &mut Vec<RawPacket>) -> anyhow::Result<()> {
        loop {
            let mut packet = ffmpeg_next::codec::packet::Packet::empty();
            match self.inner.receive_packet(&mut packet) {
                Ok(()) => out.push(RawPacket::from((packet, self.encoder_time_base))),
                Err(ffmpeg_next::Error::Eof) => {
                    self.state.close();
                    return Ok(());
                }
                Err(ref e) if is_again(e) => return Ok(()),
                Err(e) => return Err(PipelineError::codec("encode", e).into()),
            }
        }
    }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
