//! Player behavior, independent of rendering.
//!
//! Every type here is driven by explicit inputs (pointer positions, key
//! events, `Instant`s, host reports), which keeps the view thin and the
//! behavior testable without a window or a decoder.

mod click;
mod fullscreen;
mod idle;
mod keyboard;
mod playback;
mod preview;
mod time;

pub use click::{ClickAction, ClickDisambiguator};
pub use fullscreen::{FullscreenCoordinator, FullscreenHost, ViewportHost};
pub use idle::IdleTracker;
pub use keyboard::{pressed_shortcuts, Shortcut};
pub use playback::{PlaybackController, PlaybackState};
pub use preview::{pointer_fraction, preview_offset, ScrubPreview};
pub use time::{format_clock, format_remaining};
