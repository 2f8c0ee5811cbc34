use crossbeam_channel::{bounded, unbounded, Receiver, RecvError, Sender, TrySendError};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::Packet;
use std::path::Path;
use std::thread::{self, JoinHandle};

use super::decoder::{pack_rgba, VideoInput};
use crate::error::{PlayerError, Result};

/// Give up on reaching the exact timestamp after this many decoded frames
/// and show whatever was decoded last.
const MAX_FRAMES_PER_GRAB: usize = 48;
/// Upper bound on packets read per grab, whatever stream they belong to
const MAX_PACKETS_PER_GRAB: usize = 1024;
/// Frames within this distance before the target count as a hit (seconds)
const GRAB_TOLERANCE: f64 = 0.25;

/// A rasterized preview bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewFrame {
    /// Time that was requested
    pub time: f64,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Extracts single frames at arbitrary timestamps, independently of playback.
pub trait FrameGrabber {
    /// Ask for a frame at `seconds`. Fire and forget; results arrive later.
    fn request(&mut self, seconds: f64);

    /// The most recent finished frame, if one arrived since the last call.
    fn latest(&mut self) -> Option<PreviewFrame>;
}

enum GrabCommand {
    Grab(f64),
    Stop,
}

/// Hidden second decoder used only for scrub previews.
///
/// Owns its own demuxer and decoder so its seeks never touch the visible
/// player. Requests queued while a grab is running are coalesced to the
/// latest one.
pub struct ThumbnailWorker {
    commands: Sender<GrabCommand>,
    results: Receiver<PreviewFrame>,
    handle: Option<JoinHandle<()>>,
}

impl ThumbnailWorker {
    pub fn spawn(path: &Path, size: [u32; 2]) -> Result<Self> {
        let path = path.to_path_buf();
        let (command_tx, command_rx) = unbounded();
        let (result_tx, result_rx) = bounded(2);
        let (ready_tx, ready_rx) = bounded(1);

        let handle = thread::Builder::new()
            .name("cinema-thumbnails".into())
            .spawn(move || {
                let input = match VideoInput::open(&path) {
                    Ok(input) => {
                        let _ = ready_tx.send(Ok(()));
                        input
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = grab_loop(input, size, command_rx, result_tx) {
                    log::warn!("Thumbnail worker stopped: {}", e);
                }
            })?;

        // Surface a broken file to the caller instead of failing silently later
        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(PlayerError::Decoder);
            }
        }

        Ok(Self {
            commands: command_tx,
            results: result_rx,
            handle: Some(handle),
        })
    }
}

impl FrameGrabber for ThumbnailWorker {
    fn request(&mut self, seconds: f64) {
        if self.commands.send(GrabCommand::Grab(seconds)).is_err() {
            log::debug!("Thumbnail worker gone, dropping request for {:.2}s", seconds);
        }
    }

    fn latest(&mut self) -> Option<PreviewFrame> {
        self.results.try_iter().last()
    }
}

impl Drop for ThumbnailWorker {
    fn drop(&mut self) {
        let _ = self.commands.send(GrabCommand::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn grab_loop(
    mut input: VideoInput,
    size: [u32; 2],
    commands: Receiver<GrabCommand>,
    results: Sender<PreviewFrame>,
) -> Result<()> {
    let mut scaler = input.scaler(size[0], size[1])?;

    loop {
        let mut target = match commands.recv() {
            Ok(GrabCommand::Grab(t)) => t,
            Ok(GrabCommand::Stop) | Err(RecvError) => return Ok(()),
        };
        for command in commands.try_iter() {
            match command {
                GrabCommand::Grab(t) => target = t,
                GrabCommand::Stop => return Ok(()),
            }
        }

        let Some(decoded) = decode_near(&mut input, target) else {
            log::debug!("No preview frame decoded near {:.2}s", target);
            continue;
        };

        let mut rgba = VideoFrame::empty();
        scaler.run(&decoded, &mut rgba)?;
        let frame = PreviewFrame {
            time: target,
            width: rgba.width(),
            height: rgba.height(),
            rgba: pack_rgba(&rgba),
        };

        match results.try_send(frame) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => return Ok(()),
        }
    }
}

/// Seek and decode forward until a frame at (or just before) `target`.
/// Falls back to the last frame decoded, which may be stale.
fn decode_near(input: &mut VideoInput, target: f64) -> Option<VideoFrame> {
    if let Err(e) = input.seek(target) {
        log::debug!("Preview seek to {:.2}s failed: {}", target, e);
    }

    let mut last = None;
    let mut decoded = 0;

    for _ in 0..MAX_PACKETS_PER_GRAB {
        if decoded >= MAX_FRAMES_PER_GRAB {
            break;
        }
        let mut packet = Packet::empty();
        match packet.read(&mut input.input) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Eof) => break,
            Err(_) => continue,
        }
        if packet.stream() != input.stream_index || input.decoder.send_packet(&packet).is_err() {
            continue;
        }

        loop {
            let mut frame = VideoFrame::empty();
            if input.decoder.receive_frame(&mut frame).is_err() {
                break;
            }
            decoded += 1;
            let hit = input.pts_seconds(&frame) >= target - GRAB_TOLERANCE;
            last = Some(frame);
            if hit {
                return last;
            }
        }
    }

    last
}
