use std::time::Duration;

/// Tunables for the player view.
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    /// Window in which a second click turns a click into a double click
    pub click_window: Duration,
    /// Period of the idle check that hides the controls
    pub idle_check_interval: Duration,
    /// Seconds jumped by the skip buttons and arrow keys
    pub skip_seconds: f64,
    /// Size of the scrub-preview bitmap in pixels
    pub preview_size: [u32; 2],
    /// Hover positions within the same bucket reuse the last preview request
    pub preview_bucket: f64,
    /// Height of the transport bar overlay
    pub controls_height: f32,
    /// User agent sent when fetching remote sources
    pub user_agent: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            click_window: Duration::from_millis(200),
            idle_check_interval: Duration::from_millis(500),
            skip_seconds: 10.0,
            preview_size: [200, 120],
            preview_bucket: 0.1,
            controls_height: 48.0,
            user_agent: concat!("egui_cinema/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PlayerConfig {
    pub fn with_click_window(mut self, window: Duration) -> Self {
        self.click_window = window;
        self
    }

    pub fn with_idle_check_interval(mut self, interval: Duration) -> Self {
        self.idle_check_interval = interval;
        self
    }

    /// Negative or non-finite values fall back to the default.
    pub fn with_skip_seconds(mut self, seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            self.skip_seconds = seconds;
        }
        self
    }

    pub fn with_preview_size(mut self, width: u32, height: u32) -> Self {
        self.preview_size = [width.max(1), height.max(1)];
        self
    }

    pub fn with_controls_height(mut self, height: f32) -> Self {
        self.controls_height = height;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.click_window, Duration::from_millis(200));
        assert_eq!(config.idle_check_interval, Duration::from_millis(500));
        assert_eq!(config.skip_seconds, 10.0);
        assert_eq!(config.preview_size, [200, 120]);
    }

    #[test]
    fn test_invalid_skip_is_ignored() {
        let config = PlayerConfig::default()
            .with_skip_seconds(-3.0)
            .with_skip_seconds(f64::NAN);
        assert_eq!(config.skip_seconds, 10.0);

        let config = PlayerConfig::default().with_skip_seconds(5.0);
        assert_eq!(config.skip_seconds, 5.0);
    }

    #[test]
    fn test_preview_size_never_zero() {
        let config = PlayerConfig::default().with_preview_size(0, 0);
        assert_eq!(config.preview_size, [1, 1]);
    }
}
