use crate::error::Result;

/// The window system's fullscreen capability.
pub trait FullscreenHost {
    /// Whether the host currently reports fullscreen.
    fn is_fullscreen(&self) -> bool;

    /// Ask to enter or leave fullscreen. The change, if granted, shows up
    /// in a later [`FullscreenHost::is_fullscreen`].
    fn request_fullscreen(&self, fullscreen: bool) -> Result<()>;
}

/// egui viewport as a fullscreen host.
pub struct ViewportHost<'a> {
    ctx: &'a egui::Context,
}

impl<'a> ViewportHost<'a> {
    pub fn new(ctx: &'a egui::Context) -> Self {
        Self { ctx }
    }
}

impl FullscreenHost for ViewportHost<'_> {
    fn is_fullscreen(&self) -> bool {
        self.ctx
            .input(|i| i.viewport().fullscreen)
            .unwrap_or(false)
    }

    fn request_fullscreen(&self, fullscreen: bool) -> Result<()> {
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::Fullscreen(fullscreen));
        Ok(())
    }
}

/// Tracks fullscreen status as the host reports it.
///
/// The state only changes through [`FullscreenCoordinator::sync`], so a
/// rejected request or an external change (Escape, a window manager
/// gesture) can never leave it out of step with the host.
#[derive(Default)]
pub struct FullscreenCoordinator {
    fullscreen: bool,
}

impl FullscreenCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn toggle(&self, host: &impl FullscreenHost) {
        let target = !host.is_fullscreen();
        if let Err(e) = host.request_fullscreen(target) {
            log::warn!("Fullscreen request ({}) failed: {}", target, e);
        }
    }

    pub fn exit(&self, host: &impl FullscreenHost) {
        if host.is_fullscreen() {
            if let Err(e) = host.request_fullscreen(false) {
                log::warn!("Leaving fullscreen failed: {}", e);
            }
        }
    }

    /// Adopt the host's status. Returns true when it changed.
    pub fn sync(&mut self, host: &impl FullscreenHost) -> bool {
        let reported = host.is_fullscreen();
        if reported == self.fullscreen {
            return false;
        }
        log::debug!("Fullscreen changed to {}", reported);
        self.fullscreen = reported;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;
    use std::cell::Cell;

    /// Host that applies granted requests immediately.
    #[derive(Default)]
    struct FakeHost {
        fullscreen: Cell<bool>,
        reject: bool,
        requests: Cell<usize>,
    }

    impl FullscreenHost for FakeHost {
        fn is_fullscreen(&self) -> bool {
            self.fullscreen.get()
        }

        fn request_fullscreen(&self, fullscreen: bool) -> Result<()> {
            self.requests.set(self.requests.get() + 1);
            if self.reject {
                return Err(PlayerError::Fullscreen);
            }
            self.fullscreen.set(fullscreen);
            Ok(())
        }
    }

    #[test]
    fn test_toggle_then_sync() {
        let host = FakeHost::default();
        let mut coordinator = FullscreenCoordinator::new();

        coordinator.toggle(&host);
        assert!(coordinator.sync(&host));
        assert!(coordinator.is_fullscreen());

        coordinator.toggle(&host);
        assert!(coordinator.sync(&host));
        assert!(!coordinator.is_fullscreen());
    }

    #[test]
    fn test_rejected_request_changes_nothing() {
        let host = FakeHost {
            reject: true,
            ..Default::default()
        };
        let mut coordinator = FullscreenCoordinator::new();

        coordinator.toggle(&host);
        assert_eq!(host.requests.get(), 1);
        assert!(!coordinator.sync(&host));
        assert!(!coordinator.is_fullscreen());
    }

    #[test]
    fn test_external_exit_is_picked_up() {
        let host = FakeHost::default();
        let mut coordinator = FullscreenCoordinator::new();
        coordinator.toggle(&host);
        coordinator.sync(&host);

        // User pressed Escape outside our control
        host.fullscreen.set(false);
        assert!(coordinator.sync(&host));
        assert_eq!(coordinator.is_fullscreen(), host.is_fullscreen());
        assert!(!coordinator.sync(&host));
    }

    #[test]
    fn test_exit_is_noop_when_windowed() {
        let host = FakeHost::default();
        let coordinator = FullscreenCoordinator::new();
        coordinator.exit(&host);
        assert_eq!(host.requests.get(), 0);
    }
}
