use std::path::{Path, PathBuf};

use ffmpeg_next::{Rational, codec::Parameters};

use crate::{error::PipelineError, packet::RawPacket};

/// Where encoded packets end up. The header goes out once before the first
/// packet, the trailer once after the last.
pub trait PacketSink {
    fn write_header(&mut self) -> anyhow::Result<()>;

    /// Time base of an output stream as fixed by the container. Only final
    /// after the header has been written.
    fn stream_time_base(&self, index: usize) -> Option<Rational>;

    /// Writes a packet whose stream index and timestamps are already in the
    /// output stream's terms.
    fn write_packet(&mut self, packet: RawPacket) -> anyhow::Result<()>;

    fn write_trailer(&mut self) -> anyhow::Result<()>;
}

/// Muxer writing to a file. Closed when dropped.
pub struct AvOutput {
    path: PathBuf,
    inner: ffmpeg_next::format::context::Output,
    have_written_header: bool,
    have_written_trailer: bool,
}

impl AvOutput {
    pub fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let output = ffmpeg_next::format::output(path)
            .map_err(|e| PipelineError::container("create output", e))?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: output,
            have_written_header: false,
            have_written_trailer: false,
        })
    }

    /// Whether the container wants codec extradata in the stream header
    /// instead of in-band (mp4, mov, mkv...).
    pub fn requires_global_header(&self) -> bool {
        self.inner
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER)
    }

    pub fn has_written_header(&self) -> bool {
        self.have_written_header
    }

    pub fn has_written_trailer(&self) -> bool {
        self.have_written_trailer
    }

    /// Adds a video stream described by opened-encoder `parameters`, returning
    /// its index.
    pub fn add_video_stream(
        &mut self,
        codec_name: &str,
        parameters: Parameters,
        time_base: Rational,
        frame_rate: Rational,
    ) -> anyhow::Result<usize> {
        if self.have_written_header {
            return Err(
                PipelineError::InvalidState("stream added after header".to_string()).into(),
            );
        }
        let codec = ffmpeg_next::encoder::find_by_name(codec_name);
        let mut stream = self
            .inner
            .add_stream(codec)
            .map_err(|e| PipelineError::container("add stream", e))?;
        stream.set_parameters(parameters);
        stream.set_time_base(time_base);
        stream.set_rate(frame_rate);
        stream.set_avg_frame_rate(frame_rate);
        Ok(stream.index())
    }
}

impl PacketSink for AvOutput {
    fn write_header(&mut self) -> anyhow::Result<()> {
        if self.have_written_header {
            return Err(PipelineError::InvalidState("header already written".to_string()).into());
        }
        self.inner
            .write_header()
            .map_err(|e| PipelineError::container("write header", e))?;
        self.have_written_header = true;
        log::debug!("header written: {}", self.path.display());
        Ok(())
    }

    fn stream_time_base(&self, index: usize) -> Option<Rational> {
        self.inner.stream(index).map(|s| s.time_base())
    }

    fn write_packet(&mut self, mut packet: RawPacket) -> anyhow::Result<()> {
        if !self.have_written_header || self.have_written_trailer {
            return Err(PipelineError::InvalidState(
                "packet written outside header/trailer".to_string(),
            )
            .into());
        }
        let p = packet.get_mut();
        p.set_position(-1);
        p.write_interleaved(&mut self.inner)
            .map_err(|e| PipelineError::container("write packet", e))?;
        Ok(())
    }

    fn write_trailer(&mut self) -> anyhow::Result<()> {
        if self.have_written_header && !self.have_written_trailer {
            self.have_written_trailer = true;
            self.inner
                .write_trailer()
                .map_err(|e| PipelineError::container("write trailer", e))?;
            log::debug!("trailer written: {}", self.path.display());
        }
        Ok(())
    }
}
