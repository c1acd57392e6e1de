use ffmpeg_next::{Rational, codec::Parameters};

use crate::{
    codec::CodecState, error::PipelineError, error::is_again, frame::RawVideoFrame,
    packet::RawPacket, stream::AvStream,
};

/// Outcome of one decode call.
pub enum Decoded {
    Frames(Vec<RawVideoFrame>),
    /// The codec buffered the input and needs more before it can output.
    NeedMoreInput,
    /// Every buffered frame has been returned; the decoder is closed.
    EndOfStream,
}

impl Decoded {
    /// Frames carried by this result, empty for the other variants.
    pub fn into_frames(self) -> Vec<RawVideoFrame> {
        match self {
            Decoded::Frames(frames) => frames,
            Decoded::NeedMoreInput | Decoded::EndOfStream => Vec::new(),
        }
    }
}

/// Video decoder for one input stream.
pub struct Decoder {
    stream_index: usize,
    inner: ffmpeg_next::codec::decoder::Video,
    decoder_time_base: Rational,
    state: CodecState,
}

impl Decoder {
    pub fn new(stream: &AvStream) -> anyhow::Result<Self> {
        if !stream.is_video() {
            return Err(PipelineError::allocation(
                "decoder",
                format!("stream {} is not a video stream", stream.index()),
            )
            .into());
        }
        Self::from_parameters(stream.index(), stream.parameters().clone(), stream.time_base())
    }

    pub fn from_parameters(
        stream_index: usize,
        parameters: Parameters,
        time_base: Rational,
    ) -> anyhow::Result<Self> {
        let mut decoder_ctx = ffmpeg_next::codec::Context::new();
        unsafe {
            (*decoder_ctx.as_mut_ptr()).time_base = time_base.into();
        }
        decoder_ctx
            .set_parameters(parameters)
            .map_err(|e| PipelineError::allocation("decoder", e.to_string()))?;

        let video_decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| PipelineError::allocation("decoder", e.to_string()))?;
        if video_decoder.format() == ffmpeg_next::format::Pixel::None
            || video_decoder.width() == 0
            || video_decoder.height() == 0
        {
            return Err(PipelineError::allocation("decoder", "missing codec parameters").into());
        }

        let decoder_time_base = match video_decoder.time_base() {
            tb if tb.denominator() == 0 || tb.numerator() == 0 => time_base,
            tb => tb,
        };
        log::debug!(
            "decoder opened: stream {}, {:?} {}x{}, time base {}",
            stream_index,
            video_decoder.format(),
            video_decoder.width(),
            video_decoder.height(),
            decoder_time_base
        );

        Ok(Self {
            stream_index,
            inner: video_decoder,
            decoder_time_base,
            state: CodecState::Open,
        })
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /// Time base of the pts carried by decoded frames.
    pub fn time_base(&self) -> Rational {
        self.decoder_time_base
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn format(&self) -> ffmpeg_next::format::Pixel {
        self.inner.format()
    }

    pub fn state(&self) -> CodecState {
        self.state
    }

    /// Feeds one packet, or end of input when `packet` is `None`, and returns
    /// every frame the codec can produce right now.
    ///
    /// The packet is consumed and released here whatever the outcome.
    pub fn decode(&mut self, packet: Option<RawPacket>) -> anyhow::Result<Decoded> {
        match packet {
            Some(mut packet) => {
                if packet.index() != self.stream_index {
                    return Err(PipelineError::InvalidState(format!(
                        "packet of stream {} fed to decoder of stream {}",
                        packet.index(),
                        self.stream_index
                    ))
                    .into());
                }
                self.state.feed("decode")?;
                packet.rescale_to(self.decoder_time_base);
                self.inner
                    .send_packet(packet.packet())
                    .map_err(|e| PipelineError::codec("decode", e))?;
            }
            None => {
                if self.state.is_closed() {
                    return Ok(Decoded::EndOfStream);
                }
                if self.state.begin_drain() {
                    self.inner
                        .send_eof()
                        .map_err(|e| PipelineError::codec("decode", e))?;
                }
            }
        }

        self.receive_frames()
    }

    /// Decodes a single-picture input: one packet in, one frame out. Flushes
    /// the codec when the packet alone did not produce a frame.
    pub fn decode_single(&mut self, packet: RawPacket) -> anyhow::Result<RawVideoFrame> {
        let mut frames = self.decode(Some(packet))?.into_frames();
        if frames.is_empty() {
            frames = self.decode(None)?.into_frames();
        }
        if frames.len() > 1 {
            log::warn!(
                "single picture decode produced {} frames, keeping the first",
                frames.len()
            );
        }
        frames.into_iter().next().ok_or_else(|| {
            PipelineError::InvalidState("decoder produced no frame for the picture".into()).into()
        })
    }

    fn receive_frames(&mut self) -> anyhow::Result<Decoded> {
        let mut frames = Vec::new();
        loop {
            let mut frame = ffmpeg_next::frame::Video::empty();
            match self.inner.receive_frame(&mut frame) {
                Ok(()) => {
                    if frame.pts().is_none() {
                        let ts = frame.timestamp();
                        frame.set_pts(ts);
                    }
                    frames.push(RawVideoFrame::from(frame));
                }
                Err(ffmpeg_next::Error::Eof) => {
                    self.state.close();
                    break;
                }
                Err(ref e) if is_again(e) => break,
                Err(e) => return Err(PipelineError::codec("decode", e).into()),
            }
        }

        if !frames.is_empty() {
            Ok(Decoded::Frames(frames))
        } else if self.state.is_closed() {
            Ok(Decoded::EndOfStream)
        } else {
            Ok(Decoded::NeedMoreInput)
        }
    }
}
