use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{error::PipelineError, packet::RawPacket, stream::AvStream};

/// Demuxer over a file. Closed when dropped.
pub struct AvInput {
    path: PathBuf,
    inner: ffmpeg_next::format::context::Input,
    streams: HashMap<usize, AvStream>,
}

impl AvInput {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let input = ffmpeg_next::format::input(path)
            .map_err(|e| PipelineError::container("open input", e))?;

        let mut streams = HashMap::new();
        for stream in input.streams() {
            streams.insert(stream.index(), AvStream::from(stream));
        }

        Ok(Self {
            path: path.to_path_buf(),
            inner: input,
            streams,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short name(s) of the container format, e.g. "mov,mp4,m4a,3gp,3g2,mj2".
    pub fn format_name(&self) -> &str {
        self.inner.format().name()
    }

    /// Container duration in seconds, `None` when the demuxer does not know.
    pub fn duration_secs(&self) -> Option<f64> {
        let d = self.inner.duration();
        if d == ffmpeg_next::ffi::AV_NOPTS_VALUE as i64 || d <= 0 {
            None
        } else {
            Some(d as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64)
        }
    }

    pub fn streams(&self) -> &HashMap<usize, AvStream> {
        &self.streams
    }

    pub fn stream(&self, index: usize) -> Option<&AvStream> {
        self.streams.get(&index)
    }

    /// The stream FFmpeg ranks best among the video streams, if any.
    pub fn best_video_stream(&self) -> Option<&AvStream> {
        let index = self
            .inner
            .streams()
            .best(ffmpeg_next::media::Type::Video)?
            .index();
        self.streams.get(&index)
    }

    /// Next packet in container order, `None` once the input is exhausted.
    ///
    /// The packet carries the time base of the stream it belongs to.
    pub fn read_packet(&mut self) -> anyhow::Result<Option<RawPacket>> {
        let mut packet = ffmpeg_next::codec::packet::Packet::empty();
        match packet.read(&mut self.inner) {
            Ok(()) => {
                let time_base = self
                    .streams
                    .get(&packet.stream())
                    .map(|s| s.time_base())
                    .ok_or_else(|| {
                        anyhow::anyhow!("packet for unknown stream {}", packet.stream())
                    })?;
                Ok(Some(RawPacket::from((packet, time_base))))
            }
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(e) => Err(PipelineError::container("read packet", e).into()),
        }
    }
}
