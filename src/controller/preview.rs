use crate::player::{FrameGrabber, PreviewFrame};

/// Fractional position of the pointer along the track, within `0.0..=1.0`.
pub fn pointer_fraction(pointer_x: f32, track_left: f32, track_width: f32) -> f32 {
    if track_width <= 0.0 || !pointer_x.is_finite() {
        return 0.0;
    }
    ((pointer_x - track_left) / track_width).clamp(0.0, 1.0)
}

/// Horizontal center of the preview, kept fully inside the viewport.
pub fn preview_offset(pointer_x: f32, preview_width: f32, viewport_width: f32) -> f32 {
    let half = preview_width / 2.0;
    if viewport_width <= preview_width {
        return viewport_width / 2.0;
    }
    pointer_x.clamp(half, viewport_width - half)
}

/// Hover state of the timeline thumbnail.
///
/// The preview is shown while the pointer is over the track and a bitmap
/// exists. Leaving the track hides it but keeps the last bitmap, which is
/// shown again (possibly stale) on the next hover until a fresh one lands.
pub struct ScrubPreview {
    bucket: f64,
    preview_width: f32,
    preview_time: Option<f64>,
    offset_x: f32,
    frame: Option<PreviewFrame>,
    last_bucket: Option<i64>,
}

impl ScrubPreview {
    pub fn new(bucket: f64, preview_width: f32) -> Self {
        Self {
            bucket: if bucket > 0.0 { bucket } else { 0.1 },
            preview_width,
            preview_time: None,
            offset_x: 0.0,
            frame: None,
            last_bucket: None,
        }
    }

    /// Pointer moved over the track.
    pub fn hover(
        &mut self,
        grabber: &mut impl FrameGrabber,
        pointer_x: f32,
        track: (f32, f32),
        duration: f64,
        viewport_width: f32,
    ) {
        if duration <= 0.0 {
            self.preview_time = None;
            return;
        }

        let (track_left, track_width) = track;
        let fraction = pointer_fraction(pointer_x, track_left, track_width) as f64;
        let time = fraction * duration;

        self.preview_time = Some(time);
        self.offset_x = preview_offset(pointer_x, self.preview_width, viewport_width);

        let bucket = (time / self.bucket).round() as i64;
        if self.last_bucket != Some(bucket) {
            self.last_bucket = Some(bucket);
            grabber.request(time);
        }
    }

    /// Pointer left the track.
    pub fn leave(&mut self) {
        self.preview_time = None;
        self.last_bucket = None;
    }

    /// Collect a finished bitmap. Returns true when a new one arrived.
    pub fn poll(&mut self, grabber: &mut impl FrameGrabber) -> bool {
        match grabber.latest() {
            Some(frame) => {
                self.frame = Some(frame);
                true
            }
            None => false,
        }
    }

    /// Forget everything, e.g. when the source changes.
    pub fn reset(&mut self) {
        self.leave();
        self.frame = None;
    }

    pub fn is_visible(&self) -> bool {
        self.preview_time.is_some() && self.frame.is_some()
    }

    pub fn preview_time(&self) -> Option<f64> {
        self.preview_time
    }

    pub fn offset_x(&self) -> f32 {
        self.offset_x
    }

    pub fn frame(&self) -> Option<&PreviewFrame> {
        self.frame.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct RecordingGrabber {
        requests: Vec<f64>,
        ready: VecDeque<PreviewFrame>,
    }

    impl FrameGrabber for RecordingGrabber {
        fn request(&mut self, seconds: f64) {
            self.requests.push(seconds);
        }

        fn latest(&mut self) -> Option<PreviewFrame> {
            self.ready.drain(..).last()
        }
    }

    fn bitmap(time: f64) -> PreviewFrame {
        PreviewFrame {
            time,
            width: 200,
            height: 120,
            rgba: vec![0; 200 * 120 * 4],
        }
    }

    #[test]
    fn test_preview_time_is_fraction_of_duration() {
        let duration = 137.0;
        for step in 0..=20 {
            let fraction = step as f32 / 20.0;
            let mut preview = ScrubPreview::new(0.1, 200.0);
            let mut grabber = RecordingGrabber::default();
            preview.hover(&mut grabber, 50.0 + fraction * 400.0, (50.0, 400.0), duration, 1000.0);

            let expected = fraction as f64 * duration;
            let time = preview.preview_time().unwrap();
            assert!((time - expected).abs() < 1e-3, "{time} vs {expected}");
        }
    }

    #[test]
    fn test_pointer_outside_track_is_clamped() {
        assert_eq!(pointer_fraction(10.0, 50.0, 400.0), 0.0);
        assert_eq!(pointer_fraction(900.0, 50.0, 400.0), 1.0);
        assert_eq!(pointer_fraction(250.0, 50.0, 400.0), 0.5);
        assert_eq!(pointer_fraction(250.0, 50.0, 0.0), 0.0);
    }

    #[test]
    fn test_offset_stays_on_screen() {
        assert_eq!(preview_offset(20.0, 200.0, 800.0), 100.0);
        assert_eq!(preview_offset(790.0, 200.0, 800.0), 700.0);
        assert_eq!(preview_offset(400.0, 200.0, 800.0), 400.0);
        assert_eq!(preview_offset(50.0, 200.0, 150.0), 75.0);
    }

    #[test]
    fn test_requests_are_deduplicated_per_bucket() {
        let mut preview = ScrubPreview::new(1.0, 200.0);
        let mut grabber = RecordingGrabber::default();

        // 100px track over 100s: 1px per second
        preview.hover(&mut grabber, 10.0, (0.0, 100.0), 100.0, 800.0);
        preview.hover(&mut grabber, 10.2, (0.0, 100.0), 100.0, 800.0);
        preview.hover(&mut grabber, 12.0, (0.0, 100.0), 100.0, 800.0);
        assert_eq!(grabber.requests.len(), 2);

        // Re-entering the same spot asks again
        preview.leave();
        preview.hover(&mut grabber, 12.0, (0.0, 100.0), 100.0, 800.0);
        assert_eq!(grabber.requests.len(), 3);
    }

    #[test]
    fn test_visibility_needs_hover_and_bitmap() {
        let mut preview = ScrubPreview::new(0.1, 200.0);
        let mut grabber = RecordingGrabber::default();

        preview.hover(&mut grabber, 40.0, (0.0, 100.0), 60.0, 800.0);
        assert!(!preview.is_visible());

        grabber.ready.push_back(bitmap(1.0));
        grabber.ready.push_back(bitmap(24.0));
        assert!(preview.poll(&mut grabber));
        assert!(preview.is_visible());
        assert_eq!(preview.frame().map(|f| f.time), Some(24.0));

        preview.leave();
        assert!(!preview.is_visible());
        assert!(preview.frame().is_some(), "bitmap is kept for reuse");

        preview.reset();
        assert!(preview.frame().is_none());
    }

    #[test]
    fn test_unknown_duration_shows_nothing() {
        let mut preview = ScrubPreview::new(0.1, 200.0);
        let mut grabber = RecordingGrabber::default();
        preview.hover(&mut grabber, 40.0, (0.0, 100.0), 0.0, 800.0);
        assert!(preview.preview_time().is_none());
        assert!(grabber.requests.is_empty());
    }
}
