use ffmpeg_next::Rational;

use crate::timebase;

/// A coded unit: one compressed access unit tagged with the time base its
/// timestamps are expressed in.
///
/// Not `Clone`: a packet has exactly one owner at a time and is released when
/// that owner drops it.
pub struct RawPacket {
    packet: ffmpeg_next::codec::packet::Packet,
    time_base: Rational,
}

impl RawPacket {
    pub fn pts(&self) -> Option<i64> {
        self.packet.pts()
    }

    pub fn dts(&self) -> Option<i64> {
        self.packet.dts()
    }

    pub fn duration(&self) -> i64 {
        self.packet.duration()
    }

    pub fn size(&self) -> usize {
        self.packet.size()
    }

    pub fn index(&self) -> usize {
        self.packet.stream()
    }

    pub fn set_index(&mut self, index: usize) {
        self.packet.set_stream(index);
    }

    pub fn is_key(&self) -> bool {
        self.packet.is_key()
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Re-expresses pts, dts and duration in `time_base`.
    ///
    /// # Panics
    ///
    /// Panics on a zero time base, like [`timebase::rescale`].
    pub fn rescale_to(&mut self, time_base: Rational) {
        if time_base == self.time_base {
            return;
        }
        timebase::assert_valid(self.time_base, time_base);
        self.packet.rescale_ts(self.time_base, time_base);
        self.time_base = time_base;
    }

    pub fn get_mut(&mut self) -> &mut ffmpeg_next::codec::packet::Packet {
        &mut self.packet
    }

    pub fn packet(&self) -> &ffmpeg_next::codec::packet::Packet {
        &self.packet
    }
}

impl From<(ffmpeg_next::codec::packet::Packet, Rational)> for RawPacket {
    fn from((packet, time_base): (ffmpeg_next::codec::packet::Packet, Rational)) -> Self {
        Self { packet, time_base }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(pts: i64, dts: i64, time_base: Rational) -> RawPacket {
        let mut p = ffmpeg_next::codec::packet::Packet::copy(&[0, 0, 0, 1, 0x65]);
        p.set_pts(Some(pts));
        p.set_dts(Some(dts));
        p.set_duration(1);
        RawPacket::from((p, time_base))
    }

    #[test]
    fn test_rescale_to_moves_all_timestamps() {
        let mut p = packet(2, 1, Rational::new(1, 25));
        p.rescale_to(Rational::new(1, 12800));
        assert_eq!(p.pts(), Some(1024));
        assert_eq!(p.dts(), Some(512));
        assert_eq!(p.duration(), 512);
        assert_eq!(p.time_base(), Rational::new(1, 12800));
    }

    #[test]
    fn test_rescale_keeps_missing_timestamps() {
        let mut raw = ffmpeg_next::codec::packet::Packet::copy(&[0, 0, 0, 1, 0x65]);
        raw.set_pts(Some(0));
        let mut p = RawPacket::from((raw, Rational::new(1, 25)));
        p.rescale_to(Rational::new(1, 50));
        assert_eq!(p.pts(), Some(0));
        assert_eq!(p.dts(), None);
    }

    #[test]
    fn test_index_and_size() {
        let mut p = packet(0, 0, Rational::new(1, 25));
        p.set_index(3);
        assert_eq!(p.index(), 3);
        assert_eq!(p.size(), 5);
    }

    #[test]
    fn test_rescale_to_agrees_with_timebase() {
        let from = Rational::new(1001, 30000);
        let to = Rational::new(1, 90000);
        let mut p = packet(7, 6, from);
        p.rescale_to(to);
        assert_eq!(p.pts(), Some(timebase::rescale(7, from, to)));
        assert_eq!(p.dts(), Some(timebase::rescale(6, from, to)));
    }

    #[test]
    #[should_panic(expected = "denominator cannot be zero")]
    fn test_rescale_to_zero_time_base_panics() {
        let mut p = packet(1, 1, Rational::new(1, 25));
        p.rescale_to(Rational(1, 0));
    }
}
