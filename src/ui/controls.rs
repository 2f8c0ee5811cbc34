use egui::{Align, Color32, Layout, Pos2, Rect, Slider, Ui, UiBuilder};

use crate::controller::{format_clock, format_remaining, PlaybackState};

const BAR_PADDING: f32 = 8.0;
/// Room kept right of the seek bar for the remaining time and fullscreen button
const TRAILING_SPACE: f32 = 110.0;

/// Where the pointer sits over the seek bar.
#[derive(Clone, Copy, Debug)]
pub struct TimelineHover {
    pub pointer_x: f32,
    pub track: Rect,
}

/// What the user did with the transport bar this frame.
pub struct ControlsResponse {
    pub toggle_play: bool,
    /// Relative jump in seconds
    pub skip: Option<f64>,
    pub toggle_mute: bool,
    pub volume: Option<f32>,
    pub toggle_fullscreen: bool,
    pub drag_started: bool,
    /// Seek bar value while dragging
    pub dragged_to: Option<f64>,
    pub drag_stopped: bool,
    /// Immediate seek from a click on the bar
    pub clicked_at: Option<f64>,
    pub timeline_hover: Option<TimelineHover>,
    /// Area of the bar, for placing overlays above it
    pub bar: Rect,
}

impl Default for ControlsResponse {
    fn default() -> Self {
        Self {
            toggle_play: false,
            skip: None,
            toggle_mute: false,
            volume: None,
            toggle_fullscreen: false,
            drag_started: false,
            dragged_to: None,
            drag_stopped: false,
            clicked_at: None,
            timeline_hover: None,
            bar: Rect::NOTHING,
        }
    }
}

/// Transport bar drawn over the bottom of the video.
pub struct TransportBar<'a> {
    state: &'a PlaybackState,
    fullscreen: bool,
    skip_seconds: f64,
    height: f32,
}

impl<'a> TransportBar<'a> {
    pub fn new(state: &'a PlaybackState) -> Self {
        Self {
            state,
            fullscreen: false,
            skip_seconds: 10.0,
            height: 48.0,
        }
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_skip_seconds(mut self, seconds: f64) -> Self {
        self.skip_seconds = seconds;
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn show(&self, ui: &mut Ui, video_rect: Rect) -> ControlsResponse {
        let bar = Rect::from_min_max(
            Pos2::new(video_rect.min.x, video_rect.max.y - self.height),
            video_rect.max,
        );
        let mut response = ControlsResponse {
            bar,
            ..Default::default()
        };

        ui.painter()
            .rect_filled(bar, 0.0, Color32::from_black_alpha(190));

        let builder = UiBuilder::new()
            .max_rect(bar.shrink(BAR_PADDING))
            .layout(Layout::left_to_right(Align::Center));

        ui.allocate_new_ui(builder, |ui| {
            ui.visuals_mut().override_text_color = Some(Color32::WHITE);

            if ui
                .button("⏪")
                .on_hover_text(format!("Back {}s (←)", self.skip_seconds))
                .clicked()
            {
                response.skip = Some(-self.skip_seconds);
            }

            let play_pause = if self.state.is_playing { "⏸" } else { "▶" };
            if ui.button(play_pause).on_hover_text("Play/Pause (Space)").clicked() {
                response.toggle_play = true;
            }

            if ui
                .button("⏩")
                .on_hover_text(format!("Forward {}s (→)", self.skip_seconds))
                .clicked()
            {
                response.skip = Some(self.skip_seconds);
            }

            let mute_icon = if self.state.is_muted { "🔇" } else { "🔊" };
            if ui.button(mute_icon).clicked() {
                response.toggle_mute = true;
            }

            ui.spacing_mut().slider_width = 80.0;
            let mut volume = self.state.volume;
            if ui
                .add(Slider::new(&mut volume, 0.0..=1.0).show_value(false))
                .changed()
            {
                response.volume = Some(volume);
            }

            ui.label(format_clock(self.state.current_time));

            ui.spacing_mut().slider_width = (ui.available_width() - TRAILING_SPACE).max(40.0);
            let mut position = self.state.current_time;
            let max = self.state.duration.max(f64::EPSILON);
            let seek = ui.add(
                Slider::new(&mut position, 0.0..=max)
                    .show_value(false)
                    .trailing_fill(true),
            );

            if seek.drag_started() {
                response.drag_started = true;
            }
            if seek.dragged() && seek.changed() {
                response.dragged_to = Some(position);
            }
            if seek.drag_stopped() {
                response.drag_stopped = true;
                response.dragged_to = Some(position);
            }
            if seek.clicked() {
                response.clicked_at = Some(position);
            }
            if let Some(pos) = seek.hover_pos() {
                response.timeline_hover = Some(TimelineHover {
                    pointer_x: pos.x,
                    track: seek.rect,
                });
            }

            ui.label(format!(
                "-{}",
                format_remaining(self.state.current_time, self.state.duration)
            ));

            let (icon, hint) = if self.fullscreen {
                ("🗗", "Exit fullscreen (double-click video)")
            } else {
                ("⛶", "Fullscreen (double-click video)")
            };
            if ui.button(icon).on_hover_text(hint).clicked() {
                response.toggle_fullscreen = true;
            }
        });

        response
    }
}
