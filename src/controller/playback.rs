use crate::player::{MediaEvent, MediaHandle};

/// UI-observable mirror of the media resource.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub is_muted: bool,
    /// Always within `0.0..=1.0`
    pub volume: f32,
    /// Seconds, never above `duration` once that is known
    pub current_time: f64,
    /// Seconds, 0 until metadata arrives
    pub duration: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            is_muted: false,
            volume: 1.0,
            current_time: 0.0,
            duration: 0.0,
        }
    }
}

/// Keeps [`PlaybackState`] and a [`MediaHandle`] in step in both directions.
///
/// UI commands go to the media and update the state right away; media
/// notifications and the per-frame time sync flow back into the state.
/// While the seek bar is being dragged, the dragged time wins over the
/// time the media reports.
pub struct PlaybackController<M: MediaHandle> {
    media: M,
    state: PlaybackState,
    dragging: bool,
    duration_known: bool,
}

impl<M: MediaHandle> PlaybackController<M> {
    pub fn new(mut media: M) -> Self {
        let state = PlaybackState::default();
        media.set_volume(state.volume);
        media.set_muted(state.is_muted);
        Self {
            media,
            state,
            dragging: false,
            duration_known: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn clamp_time(&self, time: f64) -> f64 {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        if self.duration_known {
            time.min(self.state.duration)
        } else {
            time
        }
    }

    pub fn toggle_play(&mut self) {
        if self.media.is_paused() {
            match self.media.play() {
                Ok(()) => self.state.is_playing = true,
                Err(e) => {
                    log::warn!("Play was rejected: {}", e);
                    self.state.is_playing = false;
                }
            }
        } else {
            self.media.pause();
            self.state.is_playing = false;
        }
    }

    /// Time reported by the media. Ignored while dragging.
    pub fn on_time_advance(&mut self, time: f64) {
        if self.dragging {
            return;
        }
        self.state.current_time = self.clamp_time(time);
    }

    /// Only the first known duration is taken.
    pub fn on_metadata_ready(&mut self, duration: f64) {
        if self.duration_known || !duration.is_finite() || duration <= 0.0 {
            return;
        }
        self.state.duration = duration;
        self.duration_known = true;
        self.state.current_time = self.clamp_time(self.state.current_time);
    }

    pub fn seek_to(&mut self, time: f64) {
        let time = self.clamp_time(time);
        self.media.seek(time);
        self.state.current_time = time;
    }

    /// Jump relative to the current time.
    pub fn skip(&mut self, delta: f64) {
        self.seek_to(self.state.current_time + delta);
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        let muted = volume == 0.0;
        self.media.set_volume(volume);
        self.media.set_muted(muted);
        self.state.volume = volume;
        self.state.is_muted = muted;
    }

    /// Muting drops the volume to 0; unmuting restores full volume.
    pub fn toggle_mute(&mut self) {
        if self.state.is_muted {
            self.set_volume(1.0);
        } else {
            self.set_volume(0.0);
        }
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Move the displayed time without touching the media.
    pub fn drag_to(&mut self, time: f64) {
        self.state.current_time = self.clamp_time(time);
    }

    /// Commit the dragged time.
    pub fn end_drag(&mut self) {
        if !self.dragging {
            return;
        }
        self.dragging = false;
        self.seek_to(self.state.current_time);
    }

    /// End a drag whose seek bar is no longer held, e.g. because the
    /// controls were hidden before the pointer was released.
    pub fn release_stale_drag(&mut self, seek_bar_held: bool) {
        if self.dragging && !seek_bar_held {
            log::debug!("Seek bar released off-screen, committing drag");
            self.end_drag();
        }
    }

    /// Seconds left to play, 0 while the duration is unknown.
    pub fn remaining(&self) -> f64 {
        (self.state.duration - self.state.current_time).max(0.0)
    }

    /// Drain media notifications into the state.
    pub fn poll_events(&mut self) {
        while let Some(event) = self.media.poll_event() {
            match event {
                MediaEvent::MetadataReady(duration) => self.on_metadata_ready(duration),
                MediaEvent::Ended => {
                    self.state.is_playing = false;
                    if self.duration_known && !self.dragging {
                        self.state.current_time = self.state.duration;
                    }
                }
                MediaEvent::Failed(reason) => {
                    log::warn!("Media failed: {}", reason);
                    self.state.is_playing = false;
                }
            }
        }
    }

    /// Per-frame sync of the displayed time with the media clock.
    pub fn sync_frame(&mut self) {
        self.poll_events();
        if !self.dragging {
            let position = self.media.position();
            self.on_time_advance(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlayerError, Result};
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct MockMedia {
        pub paused: bool,
        pub reject_play: bool,
        pub position: f64,
        pub volume: f32,
        pub muted: bool,
        pub seeks: Vec<f64>,
        pub plays: usize,
        pub pauses: usize,
        pub events: VecDeque<MediaEvent>,
    }

    impl MockMedia {
        pub fn new() -> Self {
            Self {
                paused: true,
                ..Default::default()
            }
        }
    }

    impl MediaHandle for MockMedia {
        fn play(&mut self) -> Result<()> {
            if self.reject_play {
                return Err(PlayerError::Audio("autoplay blocked".into()));
            }
            self.plays += 1;
            self.paused = false;
            Ok(())
        }

        fn pause(&mut self) {
            self.pauses += 1;
            self.paused = true;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }

        fn seek(&mut self, seconds: f64) {
            self.seeks.push(seconds);
            self.position = seconds;
        }

        fn position(&self) -> f64 {
            self.position
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn poll_event(&mut self) -> Option<MediaEvent> {
            self.events.pop_front()
        }
    }

    fn controller_with_duration(duration: f64) -> PlaybackController<MockMedia> {
        let mut controller = PlaybackController::new(MockMedia::new());
        controller.on_metadata_ready(duration);
        controller
    }

    #[test]
    fn test_toggle_play_follows_media() {
        let mut controller = controller_with_duration(60.0);
        controller.toggle_play();
        assert!(controller.state().is_playing);
        assert_eq!(controller.media().plays, 1);

        controller.toggle_play();
        assert!(!controller.state().is_playing);
        assert_eq!(controller.media().pauses, 1);
    }

    #[test]
    fn test_rejected_play_leaves_state_paused() {
        let mut media = MockMedia::new();
        media.reject_play = true;
        let mut controller = PlaybackController::new(media);

        controller.toggle_play();
        assert!(!controller.state().is_playing);
        assert!(controller.media().is_paused());
    }

    #[test]
    fn test_seek_is_clamped() {
        let mut controller = controller_with_duration(120.0);

        controller.seek_to(-5.0);
        assert_eq!(controller.state().current_time, 0.0);

        controller.seek_to(500.0);
        assert_eq!(controller.state().current_time, 120.0);
        assert_eq!(controller.media().seeks, vec![0.0, 120.0]);
    }

    #[test]
    fn test_seek_before_metadata_only_clamps_below() {
        let mut controller = PlaybackController::new(MockMedia::new());
        controller.seek_to(300.0);
        assert_eq!(controller.state().current_time, 300.0);

        // Duration arriving later pulls the time back into range
        controller.on_metadata_ready(120.0);
        assert_eq!(controller.state().current_time, 120.0);
    }

    #[test]
    fn test_duration_is_set_once() {
        let mut controller = controller_with_duration(90.0);
        controller.on_metadata_ready(45.0);
        assert_eq!(controller.state().duration, 90.0);
    }

    #[test]
    fn test_unusable_duration_is_ignored() {
        let mut controller = PlaybackController::new(MockMedia::new());
        controller.on_metadata_ready(f64::NAN);
        controller.on_metadata_ready(0.0);
        controller.on_metadata_ready(30.0);
        assert_eq!(controller.state().duration, 30.0);
    }

    #[test]
    fn test_repeated_zero_volume_is_idempotent() {
        let mut controller = controller_with_duration(10.0);
        for _ in 0..3 {
            controller.set_volume(0.0);
            assert_eq!(controller.state().volume, 0.0);
            assert!(controller.state().is_muted);
        }
        assert!(controller.media().muted);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut controller = controller_with_duration(10.0);
        controller.set_volume(1.7);
        assert_eq!(controller.state().volume, 1.0);
        assert!(!controller.state().is_muted);

        controller.set_volume(-0.3);
        assert_eq!(controller.state().volume, 0.0);
        assert!(controller.state().is_muted);
    }

    #[test]
    fn test_toggle_mute_is_symmetric() {
        let mut controller = controller_with_duration(10.0);
        controller.set_volume(0.4);

        controller.toggle_mute();
        assert_eq!(controller.state().volume, 0.0);
        assert!(controller.state().is_muted);

        controller.toggle_mute();
        assert_eq!(controller.state().volume, 1.0);
        assert!(!controller.state().is_muted);
        assert!(!controller.media().muted);
    }

    #[test]
    fn test_drag_holds_ui_time() {
        let mut controller = controller_with_duration(100.0);
        controller.media_mut().position = 10.0;
        controller.sync_frame();
        assert_eq!(controller.state().current_time, 10.0);

        controller.begin_drag();
        controller.drag_to(70.0);
        controller.media_mut().position = 11.0;
        controller.sync_frame();
        controller.on_time_advance(12.0);
        assert_eq!(controller.state().current_time, 70.0);
        assert!(controller.media().seeks.is_empty());

        controller.end_drag();
        assert_eq!(controller.media().seeks, vec![70.0]);
        controller.sync_frame();
        assert_eq!(controller.state().current_time, 70.0);
    }

    #[test]
    fn test_drag_lost_with_hidden_bar_still_commits() {
        let mut controller = controller_with_duration(120.0);
        controller.toggle_play();
        controller.media_mut().position = 3.0;
        controller.sync_frame();

        controller.begin_drag();
        controller.drag_to(70.5);
        controller.release_stale_drag(true);
        assert!(controller.is_dragging());

        // Bar hidden while the button is still down: no release ever arrives
        controller.release_stale_drag(false);
        assert!(!controller.is_dragging());
        assert_eq!(controller.media().seeks, vec![70.5]);

        controller.media_mut().position = 71.0;
        controller.sync_frame();
        assert_eq!(controller.state().current_time, 71.0);
    }

    #[test]
    fn test_release_without_drag_does_nothing() {
        let mut controller = controller_with_duration(120.0);
        controller.release_stale_drag(false);
        assert!(controller.media().seeks.is_empty());
    }

    #[test]
    fn test_skip_stays_in_range() {
        let mut controller = controller_with_duration(30.0);
        controller.seek_to(25.0);
        controller.skip(10.0);
        assert_eq!(controller.state().current_time, 30.0);
        controller.skip(-10.0);
        controller.skip(-10.0);
        controller.skip(-10.0);
        assert_eq!(controller.state().current_time, 0.0);
    }

    #[test]
    fn test_events_flow_into_state() {
        let mut media = MockMedia::new();
        media.events.push_back(MediaEvent::MetadataReady(125.0));
        let mut controller = PlaybackController::new(media);
        controller.toggle_play();

        controller.media_mut().position = 65.0;
        controller.sync_frame();
        assert_eq!(controller.state().duration, 125.0);
        assert_eq!(controller.remaining(), 60.0);

        controller.media_mut().events.push_back(MediaEvent::Ended);
        controller.poll_events();
        assert!(!controller.state().is_playing);
        assert_eq!(controller.state().current_time, 125.0);
    }

    #[test]
    fn test_reported_time_never_exceeds_duration() {
        let mut controller = controller_with_duration(20.0);
        controller.on_time_advance(20.4);
        assert_eq!(controller.state().current_time, 20.0);
    }
}
