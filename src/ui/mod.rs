pub mod controls;
mod view;

pub use controls::{ControlsResponse, TimelineHover, TransportBar};
pub use view::PlayerView;
