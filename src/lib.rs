pub mod config;
pub mod controller;
pub mod error;
pub mod player;
pub mod source;
pub mod ui;

pub use config::PlayerConfig;
pub use controller::{PlaybackController, PlaybackState};
pub use error::{PlayerError, Result};
pub use player::{MediaEvent, MediaHandle, MediaPlayer};
pub use source::{Fetcher, HttpFetcher, LocalResource, SourceLoader};
pub use ui::PlayerView;
