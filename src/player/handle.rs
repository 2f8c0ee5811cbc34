use crate::error::Result;

/// Asynchronous notifications from a media resource.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    /// Duration became known (seconds)
    MetadataReady(f64),
    /// Playback reached the end of the stream
    Ended,
    /// The decoder stopped with an error
    Failed(String),
}

/// The playback primitive the controller drives.
///
/// Implemented by [`super::MediaPlayer`] for real files and by mocks in tests.
pub trait MediaHandle {
    /// Start playback. May be rejected, in which case the resource stays paused.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Move the playback position (seconds). Completion is asynchronous.
    fn seek(&mut self, seconds: f64);

    /// Current playback position in seconds
    fn position(&self) -> f64;

    fn set_volume(&mut self, volume: f32);

    fn set_muted(&mut self, muted: bool);

    /// Next pending notification, if any.
    fn poll_event(&mut self) -> Option<MediaEvent>;
}
