use crate::{
    encoder::{Encoded, Encoder},
    error::PipelineError,
    frame::RawVideoFrame,
    output::PacketSink,
    packet::RawPacket,
};

use super::state::PipelineState;

/// Drain calls in a row that may yield nothing before the encoder is
/// considered stuck.
const MAX_IDLE_DRAIN_CALLS: usize = 16;

/// The encode half of a codec driver.
pub trait FrameEncoder {
    fn encode(&mut self, frames: Vec<RawVideoFrame>, drain: bool) -> anyhow::Result<Encoded>;
}

impl FrameEncoder for Encoder {
    fn encode(&mut self, frames: Vec<RawVideoFrame>, drain: bool) -> anyhow::Result<Encoded> {
        Encoder::encode(self, frames, drain)
    }
}

/// One main-loop step: stamps `frame` with the next pts, encodes it and
/// writes whatever packets come out. Returns the number of packets written.
pub fn encode_frame<E, S>(
    state: &mut PipelineState,
    encoder: &mut E,
    sink: &mut S,
    stream_index: usize,
    mut frame: RawVideoFrame,
) -> anyhow::Result<usize>
where
    E: FrameEncoder + ?Sized,
    S: PacketSink + ?Sized,
{
    if state.is_draining() {
        return Err(PipelineError::InvalidState("frame submitted after drain".to_string()).into());
    }
    frame.set_pts(Some(state.next_pts()));

    let packets = encoder.encode(vec![frame], false)?.into_packets();
    let written = packets.len();
    for packet in packets {
        write_packet(sink, stream_index, packet)?;
    }
    Ok(written)
}

/// Flushes the encoder until it reports end of stream, writing every packet.
/// Returns the number of packets flushed; 0 when the encoder was already
/// closed.
pub fn drain<E, S>(
    state: &mut PipelineState,
    encoder: &mut E,
    sink: &mut S,
    stream_index: usize,
) -> anyhow::Result<usize>
where
    E: FrameEncoder + ?Sized,
    S: PacketSink + ?Sized,
{
    state.start_drain();
    let mut flushed = 0;
    let mut idle = 0;
    loop {
        match encoder.encode(Vec::new(), true)? {
            Encoded::Packets(packets) => {
                idle = 0;
                for packet in packets {
                    write_packet(sink, stream_index, packet)?;
                    state.count_drained_packet();
                    flushed += 1;
                }
            }
            Encoded::NeedMoreInput => {
                idle += 1;
                if idle >= MAX_IDLE_DRAIN_CALLS {
                    return Err(PipelineError::InvalidState(
                        "encoder stopped producing output while draining".to_string(),
                    )
                    .into());
                }
            }
            Encoded::EndOfStream => break,
        }
    }
    log::debug!("drained {} packets", flushed);
    Ok(flushed)
}

/// Moves a packet from the encoder's time base into the output stream's and
/// hands it to the sink.
fn write_packet<S>(sink: &mut S, stream_index: usize, mut packet: RawPacket) -> anyhow::Result<()>
where
    S: PacketSink + ?Sized,
{
    let time_base = sink.stream_time_base(stream_index).ok_or_else(|| {
        PipelineError::InvalidState(format!("output stream {} does not exist", stream_index))
    })?;
    packet.set_index(stream_index);
    packet.rescale_to(time_base);
    log::trace!(
        "write packet stream={} pts={:?} dts={:?} size={}",
        stream_index,
        packet.pts(),
        packet.dts(),
        packet.size()
    );
    sink.write_packet(packet)
}

#[cfg(test)]
#[path = "encode_test.rs"]
mod encode_test;
