//! Container inspection: what a file holds and how many packets each stream
//! carries.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use ffmpeg_next::Rational;
use serde::Serialize;

use crate::{input::AvInput, stream::AvStream, timebase};

#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    pub index: usize,
    /// "video", "audio", "subtitle", ...
    pub kind: String,
    pub codec: String,
    /// e.g. "1/12800"
    pub time_base: String,
    /// Average frame rate, "0/0" when unknown.
    pub rate: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub packets: usize,
    pub key_packets: usize,
    /// Lowest and highest packet pts, in the stream's time base.
    pub first_pts: Option<i64>,
    pub last_pts: Option<i64>,
    /// Distance between the lowest and highest pts, in milliseconds.
    pub span_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaSummary {
    pub path: String,
    pub format: String,
    pub duration_secs: Option<f64>,
    pub streams: Vec<StreamSummary>,
}

impl MediaSummary {
    pub fn video_streams(&self) -> impl Iterator<Item = &StreamSummary> {
        self.streams.iter().filter(|s| s.kind == "video")
    }

    pub fn total_packets(&self) -> usize {
        self.streams.iter().map(|s| s.packets).sum()
    }
}

impl fmt::Display for MediaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.path, self.format)?;
        match self.duration_secs {
            Some(d) => writeln!(f, "  duration: {:.3}s", d)?,
            None => writeln!(f, "  duration: N/A")?,
        }
        for s in &self.streams {
            write!(f, "  #{} {} {}", s.index, s.kind, s.codec)?;
            if let (Some(w), Some(h)) = (s.width, s.height) {
                write!(f, " {}x{}", w, h)?;
            }
            writeln!(
                f,
                " tb={} rate={} packets={} (key {})",
                s.time_base, s.rate, s.packets, s.key_packets
            )?;
        }
        Ok(())
    }
}

impl StreamSummary {
    fn new(stream: &AvStream) -> Self {
        let params = stream.parameters();
        let is_video = stream.is_video();
        let tb = stream.time_base();
        let rate = stream.rate();
        Self {
            index: stream.index(),
            kind: format!("{:?}", stream.medium()).to_lowercase(),
            codec: params.id().name().to_string(),
            time_base: format!("{}/{}", tb.numerator(), tb.denominator()),
            rate: format!("{}/{}", rate.numerator(), rate.denominator()),
            width: is_video.then(|| stream.width()),
            height: is_video.then(|| stream.height()),
            packets: 0,
            key_packets: 0,
            first_pts: None,
            last_pts: None,
            span_ms: None,
        }
    }

    fn count(&mut self, pts: Option<i64>, key: bool) {
        self.packets += 1;
        if key {
            self.key_packets += 1;
        }
        if let Some(pts) = pts {
            self.first_pts = Some(self.first_pts.map_or(pts, |p| p.min(pts)));
            self.last_pts = Some(self.last_pts.map_or(pts, |p| p.max(pts)));
        }
    }

    fn finish(&mut self, time_base: Rational) {
        if let (Some(first), Some(last)) = (self.first_pts, self.last_pts) {
            if time_base.denominator() != 0 {
                let span = timebase::rescale(last - first, time_base, Rational(1, 1000));
                self.span_ms = Some(span);
            }
        }
    }
}

/// Opens `path`, reads it to the end and summarizes every stream.
pub fn probe(path: impl AsRef<Path>) -> anyhow::Result<MediaSummary> {
    let path = path.as_ref();
    let mut input = AvInput::open(path)?;

    let mut streams: BTreeMap<usize, StreamSummary> = input
        .streams()
        .values()
        .map(|s| (s.index(), StreamSummary::new(s)))
        .collect();

    while let Some(packet) = input.read_packet()? {
        if let Some(summary) = streams.get_mut(&packet.index()) {
            summary.count(packet.pts(), packet.is_key());
        }
    }

    for summary in streams.values_mut() {
        if let Some(stream) = input.stream(summary.index) {
            summary.finish(stream.time_base());
        }
    }

    Ok(MediaSummary {
        path: path.display().to_string(),
        format: input.format_name().to_string(),
        duration_secs: input.duration_secs(),
        streams: streams.into_values().collect(),
    })
}
