mod audio;
mod clock;
mod decoder;
mod handle;
mod ring;
mod thumbnail;
mod video;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use egui::{Color32, ColorImage, Context, TextureHandle, TextureOptions};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{PlayerError, Result};
use audio::RingSource;
use clock::PlaybackClock;
use decoder::{probe_media, spawn_decoder, DecoderCommand, DecoderLinks, OUTPUT_CHANNELS};
use ring::SampleRing;
use video::FrameQueue;

pub use handle::{MediaEvent, MediaHandle};
pub use thumbnail::{FrameGrabber, PreviewFrame, ThumbnailWorker};

/// Decoded frames buffered ahead of the clock
const FRAME_QUEUE_LEN: usize = 30;
/// Remaining time under which a drained queue counts as the end (seconds)
const END_MARGIN: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Transport {
    Paused,
    Playing,
    Ended,
}

/// The visible media resource: an FFmpeg decoder thread, a rodio sink
/// and the texture the current frame is uploaded to.
pub struct MediaPlayer {
    transport: Transport,
    seeking: Option<f64>,
    seek_generation: u64,

    width: u32,
    height: u32,
    duration: Option<f64>,

    decoder_handle: Option<JoinHandle<()>>,
    commands: Sender<DecoderCommand>,
    events: Receiver<MediaEvent>,
    stop_flag: Arc<AtomicBool>,

    // Output stream must outlive the sink
    _output_stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    sink: Sink,
    clock: PlaybackClock,
    volume: f32,
    muted: bool,

    frames: FrameQueue,
    texture: TextureHandle,
    pending_events: Vec<MediaEvent>,
}

impl MediaPlayer {
    /// Open a local file. The duration is announced through
    /// [`MediaEvent::MetadataReady`] like any other notification.
    pub fn open(path: &Path, ctx: &Context) -> Result<Self> {
        let info = probe_media(path)?;
        log::debug!(
            "Opened {:?}: {}x{}, duration {:?}, audio {}",
            path,
            info.width,
            info.height,
            info.duration,
            info.has_audio
        );

        let clock = PlaybackClock::new(info.sample_rate, OUTPUT_CHANNELS);

        let (output_stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PlayerError::Audio(e.to_string()))?;
        let sink = Sink::try_new(&stream_handle).map_err(|e| PlayerError::Audio(e.to_string()))?;

        // About one second of stereo audio
        let ring = SampleRing::new(info.sample_rate as usize * OUTPUT_CHANNELS as usize);
        sink.append(RingSource::new(ring.clone(), clock.clone()));
        sink.pause();

        let (frame_tx, frame_rx) = bounded(FRAME_QUEUE_LEN);
        let (command_tx, command_rx) = bounded(16);
        let (event_tx, event_rx) = unbounded();

        let stop_flag = Arc::new(AtomicBool::new(false));
        let decoder_handle = spawn_decoder(
            path,
            DecoderLinks {
                frames: frame_tx,
                samples: ring,
                commands: command_rx,
                events: event_tx,
            },
            clock.clone(),
            stop_flag.clone(),
        )?;

        let texture = ctx.load_texture(
            "cinema_frame",
            ColorImage::new([info.width as usize, info.height as usize], Color32::BLACK),
            TextureOptions::LINEAR,
        );

        let pending_events = info.duration.map(MediaEvent::MetadataReady).into_iter().collect();

        Ok(Self {
            transport: Transport::Paused,
            // Decoder prerolls the first frame; treat it like a seek to 0
            seeking: Some(0.0),
            seek_generation: 0,
            width: info.width,
            height: info.height,
            duration: info.duration,
            decoder_handle: Some(decoder_handle),
            commands: command_tx,
            events: event_rx,
            stop_flag,
            _output_stream: output_stream,
            _stream_handle: stream_handle,
            sink,
            clock,
            volume: 1.0,
            muted: false,
            frames: FrameQueue::new(frame_rx, FRAME_QUEUE_LEN),
            texture,
            pending_events,
        })
    }

    fn send(&self, command: DecoderCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| PlayerError::Decoder)
    }

    fn upload_fresh_frame(&mut self) {
        if let Some(frame) = self.frames.take_fresh() {
            let image = ColorImage::from_rgba_unmultiplied(
                [frame.width as usize, frame.height as usize],
                &frame.rgba,
            );
            self.texture.set(image, TextureOptions::LINEAR);
        }
    }

    fn apply_volume(&self) {
        let effective = if self.muted { 0.0 } else { self.volume };
        self.sink.set_volume(effective);
    }

    /// Pull decoded frames and detect the end of the stream. Call every repaint.
    pub fn update(&mut self, ctx: &Context) {
        if let Some(target) = self.seeking {
            if let Some(pts) = self.frames.settle_seek(target) {
                self.upload_fresh_frame();
                self.clock.set_position(pts);
                self.seeking = None;
                if self.transport == Transport::Playing {
                    self.clock.start();
                    self.sink.play();
                }
            }
            ctx.request_repaint();
            return;
        }

        if self.transport != Transport::Playing {
            return;
        }

        let now = self.clock.position();
        self.frames.advance_to(now);
        self.upload_fresh_frame();

        let at_end = self.duration.is_some_and(|d| now >= d - END_MARGIN);
        if at_end && self.frames.is_drained() {
            self.transport = Transport::Ended;
            self.sink.pause();
            self.clock.stop();
            let _ = self.send(DecoderCommand::Pause);
            self.pending_events.push(MediaEvent::Ended);
        }

        ctx.request_repaint();
    }

    pub fn texture(&self) -> &TextureHandle {
        &self.texture
    }

    pub fn video_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking.is_some()
    }
}

impl MediaHandle for MediaPlayer {
    fn play(&mut self) -> Result<()> {
        if self.transport == Transport::Playing {
            return Ok(());
        }
        if self.transport == Transport::Ended {
            self.seek(0.0);
        }
        self.send(DecoderCommand::Resume)?;
        self.transport = Transport::Playing;
        if self.seeking.is_none() {
            self.clock.start();
            self.sink.play();
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.transport != Transport::Playing {
            return;
        }
        self.transport = Transport::Paused;
        self.sink.pause();
        self.clock.stop();
        if self.send(DecoderCommand::Pause).is_err() {
            log::debug!("Pause sent to a stopped decoder");
        }
    }

    fn is_paused(&self) -> bool {
        self.transport != Transport::Playing
    }

    fn seek(&mut self, seconds: f64) {
        let target = match self.duration {
            Some(d) => seconds.clamp(0.0, d),
            None => seconds.max(0.0),
        };
        self.seeking = Some(target);
        // Hold the clock until the first frame at the target arrives
        self.sink.pause();
        self.clock.stop();
        self.seek_generation += 1;
        self.frames.restart(self.seek_generation);
        self.clock.set_position(target);
        if self.transport == Transport::Ended {
            self.transport = Transport::Paused;
        }
        if let Err(e) = self.send(DecoderCommand::Seek {
            target,
            generation: self.seek_generation,
        }) {
            log::warn!("Seek to {:.2}s dropped: {}", target, e);
        }
    }

    fn position(&self) -> f64 {
        self.seeking.unwrap_or_else(|| self.clock.position())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_volume();
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        if !self.pending_events.is_empty() {
            return Some(self.pending_events.remove(0));
        }
        self.events.try_recv().ok()
    }
}

impl Drop for MediaPlayer {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        let _ = self.commands.send(DecoderCommand::Stop);

        if let Some(handle) = self.decoder_handle.take() {
            let _ = handle.join();
        }
        log::debug!("Media player released");
    }
}
