use ffmpeg_next::{Rational, codec::Parameters, format::stream, media};

/// Picture size announced by a video stream's codec parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VideoSize {
    width: u32,
    height: u32,
}

/// Snapshot of an elementary stream taken when its container was opened.
#[derive(Clone)]
pub struct AvStream {
    index: usize,
    medium: media::Type,
    parameters: Parameters,
    time_base: Rational,
    frame_rate: Rational,
    video_size: Option<VideoSize>,
}

impl AvStream {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Unit of the timestamps carried by this stream's packets.
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Average frame rate; 0/0 when the demuxer could not tell.
    pub fn rate(&self) -> Rational {
        self.frame_rate
    }

    pub fn medium(&self) -> media::Type {
        self.medium
    }

    pub fn is_video(&self) -> bool {
        self.medium == media::Type::Video
    }

    /// 0 for non-video streams.
    pub fn width(&self) -> u32 {
        self.video_size.map_or(0, |s| s.width)
    }

    pub fn height(&self) -> u32 {
        self.video_size.map_or(0, |s| s.height)
    }
}

/// ffmpeg-next does not expose width/height on `Parameters`.
fn read_video_size(parameters: &Parameters) -> VideoSize {
    unsafe {
        let raw = parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
        VideoSize {
            width: (*raw).width.max(0) as u32,
            height: (*raw).height.max(0) as u32,
        }
    }
}

impl From<stream::Stream<'_>> for AvStream {
    fn from(stream: stream::Stream<'_>) -> Self {
        let parameters = stream.parameters();
        let medium = parameters.medium();
        let video_size = (medium == media::Type::Video).then(|| read_video_size(&parameters));
        Self {
            index: stream.index(),
            medium,
            parameters,
            time_base: stream.time_base(),
            frame_rate: stream.avg_frame_rate(),
            video_size,
        }
    }
}
