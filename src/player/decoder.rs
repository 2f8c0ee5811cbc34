use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::{Audio as AudioFrame, Video as VideoFrame};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::resampling::Context as ResamplerContext;
use ffmpeg_next::software::scaling::{Context as ScalerContext, Flags};
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type as SampleType};
use ffmpeg_next::{codec, decoder, Packet, Rational};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::clock::PlaybackClock;
use super::handle::MediaEvent;
use super::ring::SampleRing;
use crate::error::{PlayerError, Result};

/// Audio is always resampled to interleaved stereo f32.
pub const OUTPUT_CHANNELS: u16 = 2;
/// Output rate used when the file has no audio stream
const FALLBACK_SAMPLE_RATE: u32 = 44_100;

/// A decoded RGBA frame, rows tightly packed.
pub struct DecodedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pts: f64,
    /// Seek generation the frame was decoded in
    pub generation: u64,
}

pub enum DecoderCommand {
    Seek { target: f64, generation: u64 },
    Pause,
    Resume,
    Stop,
}

pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    /// None when the container does not advertise a duration
    pub duration: Option<f64>,
    pub sample_rate: u32,
    pub has_audio: bool,
}

/// Read stream parameters without starting decoding.
pub fn probe_media(path: &Path) -> Result<MediaInfo> {
    let video = VideoInput::open(path)?;

    let audio_rate = match video.input.streams().best(Type::Audio) {
        Some(stream) => {
            let audio = codec::Context::from_parameters(stream.parameters())?
                .decoder()
                .audio()?;
            Some(audio.rate())
        }
        None => None,
    };

    let duration = match video.input.duration() {
        d if d > 0 => Some(d as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64),
        _ => None,
    };

    Ok(MediaInfo {
        width: video.decoder.width(),
        height: video.decoder.height(),
        duration,
        sample_rate: audio_rate.unwrap_or(FALLBACK_SAMPLE_RATE),
        has_audio: audio_rate.is_some(),
    })
}

/// Demuxer plus decoder for the best video stream of a file.
pub(crate) struct VideoInput {
    pub input: Input,
    pub stream_index: usize,
    pub decoder: decoder::Video,
    pub time_base: Rational,
}

impl VideoInput {
    pub fn open(path: &Path) -> Result<Self> {
        let input = ffmpeg_next::format::input(path)?;
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(PlayerError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let decoder = codec::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        Ok(Self {
            input,
            stream_index,
            decoder,
            time_base,
        })
    }

    /// RGBA scaler from the native frame size to `width`×`height`.
    pub fn scaler(&self, width: u32, height: u32) -> Result<ScalerContext> {
        Ok(ScalerContext::get(
            self.decoder.format(),
            self.decoder.width(),
            self.decoder.height(),
            Pixel::RGBA,
            width,
            height,
            Flags::BILINEAR,
        )?)
    }

    /// Seek the demuxer to the keyframe at or before `seconds` and flush.
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        let ts = (seconds.max(0.0) * ffmpeg_next::ffi::AV_TIME_BASE as f64) as i64;
        self.input.seek(ts, ..ts)?;
        self.decoder.flush();
        Ok(())
    }

    pub fn pts_seconds(&self, frame: &VideoFrame) -> f64 {
        frame.pts().unwrap_or(0) as f64 * f64::from(self.time_base)
    }
}

/// Copy an RGBA frame into a tightly packed buffer, dropping row padding.
pub fn pack_rgba(frame: &VideoFrame) -> Vec<u8> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let row = width * 4;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row {
        return data[..row * height].to_vec();
    }

    let mut packed = Vec::with_capacity(row * height);
    for y in 0..height {
        let start = y * stride;
        packed.extend_from_slice(&data[start..start + row]);
    }
    packed
}

/// Endpoints the decoder thread talks through.
pub struct DecoderLinks {
    pub frames: Sender<DecodedFrame>,
    pub samples: Arc<SampleRing>,
    pub commands: Receiver<DecoderCommand>,
    pub events: Sender<MediaEvent>,
}

pub fn spawn_decoder(
    path: &Path,
    links: DecoderLinks,
    clock: PlaybackClock,
    stop_flag: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let path = path.to_path_buf();

    let handle = thread::Builder::new()
        .name("cinema-decoder".into())
        .spawn(move || {
            let events = links.events.clone();
            if let Err(e) = decode_loop(&path, links, clock, stop_flag) {
                log::error!("Decoder for {:?} stopped: {}", path, e);
                let _ = events.send(MediaEvent::Failed(e.to_string()));
            }
        })?;

    Ok(handle)
}

/// Outcome of draining the command channel.
enum Control {
    Continue,
    Seek { target: f64, generation: u64 },
    Exit,
}

fn drain_commands(
    commands: &Receiver<DecoderCommand>,
    clock: &PlaybackClock,
    paused: &mut bool,
) -> Control {
    let mut control = Control::Continue;
    loop {
        match commands.try_recv() {
            Ok(DecoderCommand::Stop) | Err(TryRecvError::Disconnected) => return Control::Exit,
            Ok(DecoderCommand::Pause) => {
                *paused = true;
                clock.stop();
            }
            Ok(DecoderCommand::Resume) => {
                *paused = false;
                clock.start();
            }
            Ok(DecoderCommand::Seek { target, generation }) => {
                control = Control::Seek { target, generation }
            }
            Err(TryRecvError::Empty) => return control,
        }
    }
}

fn decode_loop(
    path: &Path,
    links: DecoderLinks,
    clock: PlaybackClock,
    stop_flag: Arc<AtomicBool>,
) -> Result<()> {
    let DecoderLinks {
        frames,
        samples,
        commands,
        ..
    } = links;

    let mut video = VideoInput::open(path)?;
    let mut scaler = video.scaler(video.decoder.width(), video.decoder.height())?;

    let audio_index = video.input.streams().best(Type::Audio).map(|s| s.index());
    let mut audio_decoder = match audio_index.and_then(|idx| video.input.stream(idx)) {
        Some(stream) => Some(
            codec::Context::from_parameters(stream.parameters())?
                .decoder()
                .audio()?,
        ),
        None => None,
    };

    let mut resampler = match audio_decoder {
        Some(ref dec) => Some(ResamplerContext::get(
            dec.format(),
            dec.channel_layout(),
            dec.rate(),
            Sample::F32(SampleType::Packed),
            ChannelLayout::STEREO,
            clock.sample_rate(),
        )?),
        None => None,
    };
    let mut decoded = VideoFrame::empty();
    let mut rgba = VideoFrame::empty();
    let mut audio_frame = AudioFrame::empty();

    let mut paused = true;
    let mut at_eof = false;
    let mut generation = 0;
    // While paused, still decode one frame so a seek has something to show
    let mut preroll = true;

    'outer: loop {
        if stop_flag.load(Ordering::Relaxed) {
            break;
        }

        match drain_commands(&commands, &clock, &mut paused) {
            Control::Exit => return Ok(()),
            Control::Seek {
                target,
                generation: next,
            } => {
                generation = next;
                if apply_seek(&mut video, audio_decoder.as_mut(), &clock, target) {
                    at_eof = false;
                    preroll = true;
                }
            }
            Control::Continue => {}
        }

        if (paused && !preroll) || at_eof {
            thread::sleep(Duration::from_millis(10));
            continue;
        }

        let mut packet = Packet::empty();
        match packet.read(&mut video.input) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Eof) => {
                log::debug!("Reached end of {:?}", path);
                at_eof = true;
                continue;
            }
            Err(e) => {
                log::debug!("Skipping unreadable packet: {}", e);
                continue;
            }
        }

        let stream_index = packet.stream();

        if stream_index == video.stream_index {
            video.decoder.send_packet(&packet)?;

            while video.decoder.receive_frame(&mut decoded).is_ok() {
                scaler.run(&decoded, &mut rgba)?;
                let mut frame = DecodedFrame {
                    rgba: pack_rgba(&rgba),
                    width: rgba.width(),
                    height: rgba.height(),
                    pts: video.pts_seconds(&decoded),
                    generation,
                };

                // Block on a full queue, but keep answering commands
                loop {
                    match drain_commands(&commands, &clock, &mut paused) {
                        Control::Exit => return Ok(()),
                        Control::Seek {
                            target,
                            generation: next,
                        } => {
                            generation = next;
                            if apply_seek(&mut video, audio_decoder.as_mut(), &clock, target) {
                                at_eof = false;
                                preroll = true;
                            }
                            continue 'outer;
                        }
                        Control::Continue => {}
                    }

                    match frames.try_send(frame) {
                        Ok(()) => break,
                        Err(TrySendError::Full(f)) => {
                            frame = f;
                            thread::sleep(Duration::from_millis(1));
                        }
                        Err(TrySendError::Disconnected(_)) => return Ok(()),
                    }
                }
                preroll = false;
            }
        } else if Some(stream_index) == audio_index {
            if let (Some(dec), Some(resampler)) = (audio_decoder.as_mut(), resampler.as_mut()) {
                dec.send_packet(&packet)?;

                while dec.receive_frame(&mut audio_frame).is_ok() {
                    let mut resampled = AudioFrame::empty();
                    if resampler.run(&audio_frame, &mut resampled).is_err() {
                        continue;
                    }
                    samples.extend(&interleaved_f32(&resampled));
                }
            }
        }
    }

    Ok(())
}

fn apply_seek(
    video: &mut VideoInput,
    audio: Option<&mut decoder::Audio>,
    clock: &PlaybackClock,
    target: f64,
) -> bool {
    match video.seek(target) {
        Ok(()) => {
            if let Some(dec) = audio {
                dec.flush();
            }
            clock.set_position(target);
            true
        }
        Err(e) => {
            log::warn!("Seek to {:.2}s failed: {}", target, e);
            false
        }
    }
}

/// Packed stereo f32 samples of a resampled frame.
fn interleaved_f32(frame: &AudioFrame) -> Vec<f32> {
    let count = frame.samples() * OUTPUT_CHANNELS as usize;
    frame
        .data(0)
        .chunks_exact(4)
        .take(count)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
