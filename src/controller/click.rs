use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickAction {
    TogglePlay,
    ToggleFullscreen,
}

/// Tells single clicks (play/pause) from double clicks (fullscreen).
///
/// A click arms a deadline. If it expires without a second click the single
/// click fires; a second click inside the window cancels it and fires the
/// double click instead, so a double click never also toggles playback.
pub struct ClickDisambiguator {
    window: Duration,
    pending: Option<Instant>,
}

impl ClickDisambiguator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn on_click(&mut self, now: Instant) -> Option<ClickAction> {
        match self.pending.take() {
            Some(armed) if now.saturating_duration_since(armed) < self.window => {
                Some(ClickAction::ToggleFullscreen)
            }
            Some(_) => {
                // The first click outlived its window before anyone polled
                self.pending = Some(now);
                Some(ClickAction::TogglePlay)
            }
            None => {
                self.pending = Some(now);
                None
            }
        }
    }

    /// Fire the single click once its window has passed.
    pub fn poll(&mut self, now: Instant) -> Option<ClickAction> {
        let armed = self.pending?;
        if now.saturating_duration_since(armed) >= self.window {
            self.pending = None;
            Some(ClickAction::TogglePlay)
        } else {
            None
        }
    }

    /// When the pending single click would fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|armed| armed + self.window)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(200);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Feed clicks at the given offsets, polling every 10ms for a second.
    fn run(clicks: &[u64]) -> Vec<ClickAction> {
        let start = Instant::now();
        let mut clicks = clicks.iter().peekable();
        let mut disambiguator = ClickDisambiguator::new(WINDOW);
        let mut actions = Vec::new();

        for t in (0..=1000).step_by(10) {
            let now = start + ms(t);
            while clicks.peek().is_some_and(|&&c| c <= t) {
                clicks.next();
                actions.extend(disambiguator.on_click(now));
            }
            actions.extend(disambiguator.poll(now));
        }
        actions
    }

    #[test]
    fn test_single_click_toggles_play_once() {
        assert_eq!(run(&[0]), vec![ClickAction::TogglePlay]);
    }

    #[test]
    fn test_double_click_only_toggles_fullscreen() {
        assert_eq!(run(&[0, 120]), vec![ClickAction::ToggleFullscreen]);
    }

    #[test]
    fn test_slow_clicks_are_two_singles() {
        assert_eq!(
            run(&[0, 400]),
            vec![ClickAction::TogglePlay, ClickAction::TogglePlay]
        );
    }

    #[test]
    fn test_triple_click_is_double_then_single() {
        assert_eq!(
            run(&[0, 50, 100]),
            vec![ClickAction::ToggleFullscreen, ClickAction::TogglePlay]
        );
    }

    #[test]
    fn test_expired_click_fires_on_next_click() {
        let start = Instant::now();
        let mut disambiguator = ClickDisambiguator::new(WINDOW);
        assert_eq!(disambiguator.on_click(start), None);
        assert_eq!(
            disambiguator.on_click(start + ms(500)),
            Some(ClickAction::TogglePlay)
        );
        assert!(disambiguator.is_pending());
    }

    #[test]
    fn test_cancel_drops_pending_click() {
        let start = Instant::now();
        let mut disambiguator = ClickDisambiguator::new(WINDOW);
        disambiguator.on_click(start);
        assert_eq!(disambiguator.deadline(), Some(start + WINDOW));
        disambiguator.cancel();
        assert_eq!(disambiguator.poll(start + ms(300)), None);
    }
}
