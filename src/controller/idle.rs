use std::time::{Duration, Instant};

/// Hides the controls after a period without pointer activity.
///
/// Activity shows the controls and raises a flag. A periodic check consumes
/// the flag; a check that finds it lowered hides the controls.
pub struct IdleTracker {
    interval: Duration,
    last_check: Instant,
    active: bool,
    visible: bool,
}

impl IdleTracker {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_check: now,
            active: false,
            visible: true,
        }
    }

    pub fn mark_activity(&mut self) {
        self.active = true;
        self.visible = true;
    }

    /// Show the controls and restart the idle period, e.g. on fullscreen changes.
    pub fn force_visible(&mut self, now: Instant) {
        self.visible = true;
        self.active = false;
        self.last_check = now;
    }

    /// Run the idle check if it is due. Returns the visibility afterwards.
    pub fn tick(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_check) >= self.interval {
            if !self.active {
                self.visible = false;
            }
            self.active = false;
            self.last_check = now;
        }
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn next_check(&self) -> Instant {
        self.last_check + self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_hides_after_quiet_interval() {
        let start = Instant::now();
        let mut idle = IdleTracker::new(INTERVAL, start);
        assert!(idle.tick(start + ms(100)));
        assert!(!idle.tick(start + ms(500)));
    }

    #[test]
    fn test_activity_survives_one_check() {
        let start = Instant::now();
        let mut idle = IdleTracker::new(INTERVAL, start);

        idle.mark_activity();
        assert!(idle.tick(start + ms(500)));
        // Flag was consumed by the previous check
        assert!(!idle.tick(start + ms(1000)));
    }

    #[test]
    fn test_movement_shows_hidden_controls() {
        let start = Instant::now();
        let mut idle = IdleTracker::new(INTERVAL, start);
        assert!(!idle.tick(start + ms(600)));

        idle.mark_activity();
        assert!(idle.is_visible());
        assert!(idle.tick(start + ms(700)));
    }

    #[test]
    fn test_force_visible_restarts_period() {
        let start = Instant::now();
        let mut idle = IdleTracker::new(INTERVAL, start);
        assert!(!idle.tick(start + ms(500)));

        idle.force_visible(start + ms(800));
        assert!(idle.tick(start + ms(1200)));
        assert_eq!(idle.next_check(), start + ms(1300));
        assert!(!idle.tick(start + ms(1300)));
    }
}
