use thiserror::Error;

/// Errors surfaced by the player library.
///
/// None of these are fatal to the view: they are logged and reflected in
/// the placeholder surface or simply leave the previous state in place.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("ffmpeg: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("audio output: {0}")]
    Audio(String),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("decoder is no longer running")]
    Decoder,

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("fullscreen request rejected")]
    Fullscreen,
}

impl From<reqwest::Error> for PlayerError {
    fn from(err: reqwest::Error) -> Self {
        PlayerError::Fetch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
