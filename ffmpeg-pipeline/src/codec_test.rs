// Encoder/decoder behaviour against FFmpeg's built-in mpeg4 codec, which is
// present in every FFmpeg build (unlike libx264).

use ffmpeg_next::format::Pixel;

use crate::codec::CodecState;
use crate::decoder::{Decoded, Decoder};
use crate::encoder::{Encoded, Encoder, EncoderConfig, Profile};
use crate::error::PipelineError;
use crate::frame::RawVideoFrame;
use crate::packet::RawPacket;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

fn mpeg4_config() -> EncoderConfig {
    EncoderConfig {
        codec: "mpeg4".to_string(),
        profile: None,
        ..EncoderConfig::default()
    }
    .with_size(WIDTH, HEIGHT)
}

fn gray_frame(pts: i64) -> RawVideoFrame {
    let mut frame = RawVideoFrame::new(Pixel::YUV420P, WIDTH, HEIGHT);
    {
        let video = frame.get_mut();
        for plane in 0..3 {
            video.data_mut(plane).fill(128);
        }
    }
    frame.set_pts(Some(pts));
    frame
}

fn drain_all(encoder: &mut Encoder) -> anyhow::Result<Vec<RawPacket>> {
    let mut out = Vec::new();
    loop {
        match encoder.encode(Vec::new(), true)? {
            Encoded::Packets(packets) => out.extend(packets),
            Encoded::NeedMoreInput => continue,
            Encoded::EndOfStream => return Ok(out),
        }
    }
}

#[test]
fn test_encode_then_drain_yields_every_frame() -> anyhow::Result<()> {
    crate::init()?;
    let mut encoder = Encoder::new(mpeg4_config(), None)?;
    assert_eq!(encoder.state(), CodecState::Open);

    let mut main_loop = 0;
    for pts in 0..5 {
        main_loop += encoder.encode(vec![gray_frame(pts)], false)?.into_packets().len();
    }
    assert_eq!(encoder.state(), CodecState::Running);

    let drained = drain_all(&mut encoder)?.len();
    assert_eq!(main_loop + drained, 5);
    assert_eq!(encoder.state(), CodecState::Closed);

    // flushing an exhausted encoder is not an error
    assert!(matches!(encoder.encode(Vec::new(), true)?, Encoded::EndOfStream));
    Ok(())
}

#[test]
fn test_frames_after_drain_are_rejected() -> anyhow::Result<()> {
    crate::init()?;
    let mut encoder = Encoder::new(mpeg4_config(), None)?;
    encoder.encode(vec![gray_frame(0)], false)?;
    encoder.encode(Vec::new(), true)?;

    let err = encoder.encode(vec![gray_frame(1)], false).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::InvalidState(_))
    ));
    Ok(())
}

#[test]
fn test_drain_with_frames_is_rejected() -> anyhow::Result<()> {
    crate::init()?;
    let mut encoder = Encoder::new(mpeg4_config(), None)?;
    assert!(encoder.encode(vec![gray_frame(0)], true).is_err());
    Ok(())
}

#[test]
fn test_wrong_geometry_is_rejected() -> anyhow::Result<()> {
    crate::init()?;
    let mut encoder = Encoder::new(mpeg4_config(), None)?;
    let mut frame = RawVideoFrame::new(Pixel::YUV420P, WIDTH * 2, HEIGHT);
    frame.set_pts(Some(0));
    let err = encoder.encode(vec![frame], false).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Conversion(_))
    ));
    Ok(())
}

#[test]
fn test_unknown_codec_is_allocation_error() -> anyhow::Result<()> {
    crate::init()?;
    let config = EncoderConfig {
        codec: "no-such-encoder".to_string(),
        ..mpeg4_config()
    };
    let err = Encoder::new(config, None).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Allocation { .. })
    ));

    let err = Encoder::new(mpeg4_config().with_size(0, 0), None).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Allocation { .. })
    ));
    Ok(())
}

#[test]
fn test_decoder_round_trip() -> anyhow::Result<()> {
    crate::init()?;
    let mut encoder = Encoder::new(mpeg4_config(), None)?;
    let mut packets = Vec::new();
    for pts in 0..4 {
        packets.extend(encoder.encode(vec![gray_frame(pts)], false)?.into_packets());
    }
    packets.extend(drain_all(&mut encoder)?);
    assert_eq!(packets.len(), 4);

    let mut decoder = Decoder::from_parameters(0, encoder.parameters(), encoder.time_base())?;
    assert_eq!(decoder.width(), WIDTH);
    assert_eq!(decoder.height(), HEIGHT);

    let mut frames = Vec::new();
    for packet in packets {
        match decoder.decode(Some(packet))? {
            Decoded::Frames(f) => frames.extend(f),
            Decoded::NeedMoreInput => {}
            Decoded::EndOfStream => panic!("decoder closed before end of input"),
        }
    }
    loop {
        match decoder.decode(None)? {
            Decoded::Frames(f) => frames.extend(f),
            Decoded::NeedMoreInput => {}
            Decoded::EndOfStream => break,
        }
    }

    assert_eq!(frames.len(), 4);
    assert!(frames.iter().all(|f| f.width() == WIDTH && f.height() == HEIGHT));
    assert_eq!(decoder.state(), CodecState::Closed);
    assert!(matches!(decoder.decode(None)?, Decoded::EndOfStream));
    Ok(())
}

#[test]
fn test_decoder_rejects_foreign_stream() -> anyhow::Result<()> {
    crate::init()?;
    let mut encoder = Encoder::new(mpeg4_config(), None)?;
    let mut packets = encoder.encode(vec![gray_frame(0)], false)?.into_packets();
    packets.extend(drain_all(&mut encoder)?);

    let mut decoder = Decoder::from_parameters(0, encoder.parameters(), encoder.time_base())?;
    let mut packet = packets.remove(0);
    packet.set_index(1);
    assert!(decoder.decode(Some(packet)).is_err());
    Ok(())
}

#[test]
fn test_profile_ids() {
    assert_eq!(Profile::Baseline.as_raw(), 66);
    assert_eq!(Profile::Main.as_raw(), 77);
    assert_eq!(Profile::High.as_raw(), 100);
}
