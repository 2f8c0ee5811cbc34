use egui::{
    pos2, Align2, Color32, ColorImage, Context, FontId, Rect, Sense, TextureHandle,
    TextureOptions, Ui, Vec2,
};
use std::time::{Duration, Instant};

use super::controls::{ControlsResponse, TransportBar};
use crate::config::PlayerConfig;
use crate::controller::{
    format_clock, pressed_shortcuts, ClickAction, ClickDisambiguator, FullscreenCoordinator,
    FullscreenHost, IdleTracker, PlaybackController, ScrubPreview, Shortcut, ViewportHost,
};
use crate::error::Result;
use crate::player::{MediaPlayer, PreviewFrame, ThumbnailWorker};
use crate::source::{HttpFetcher, LocalResource, SourceEvent, SourceLoader};

/// How often to look for finished fetches while one is in flight
const FETCH_POLL: Duration = Duration::from_millis(50);
const PREVIEW_GAP: f32 = 8.0;
/// How long a load error stays over a video that keeps playing
const NOTICE_DURATION: Duration = Duration::from_secs(4);

/// Everything tied to one loaded source.
struct Session {
    controller: PlaybackController<MediaPlayer>,
    /// None when the preview decoder could not be started
    thumbnails: Option<ThumbnailWorker>,
    // Declared last so it is released after both decoders have stopped
    resource: LocalResource,
}

impl Session {
    fn open(resource: LocalResource, ctx: &Context, config: &PlayerConfig) -> Result<Self> {
        let media = MediaPlayer::open(resource.path(), ctx)?;

        let thumbnails = match ThumbnailWorker::spawn(resource.path(), config.preview_size) {
            Ok(worker) => Some(worker),
            Err(e) => {
                log::warn!("Scrub preview unavailable for {}: {}", resource.url(), e);
                None
            }
        };

        Ok(Self {
            controller: PlaybackController::new(media),
            thumbnails,
            resource,
        })
    }
}

/// Short message painted over the video until it expires.
struct Notice {
    message: String,
    until: Instant,
}

impl Notice {
    fn new(message: String, now: Instant) -> Self {
        Self {
            message,
            until: now + NOTICE_DURATION,
        }
    }

    fn is_active(&self, now: Instant) -> bool {
        now < self.until
    }
}

/// What the view shows when no video is on screen.
enum Placeholder {
    Empty,
    Loading(String),
    Failed(String),
}

/// The player component: video surface, transport controls, scrub preview,
/// click/keyboard handling, idle hiding and fullscreen.
///
/// Dropping the view stops both decoders, cancels every timer and releases
/// the loaded resource.
pub struct PlayerView {
    config: PlayerConfig,
    loader: SourceLoader<HttpFetcher>,
    session: Option<Session>,
    placeholder: Placeholder,
    notice: Option<Notice>,
    clicks: ClickDisambiguator,
    idle: IdleTracker,
    fullscreen: FullscreenCoordinator,
    preview: ScrubPreview,
    preview_texture: Option<TextureHandle>,
}

impl PlayerView {
    pub fn new(config: PlayerConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent)?;
        Ok(Self {
            loader: SourceLoader::new(fetcher),
            session: None,
            placeholder: Placeholder::Empty,
            notice: None,
            clicks: ClickDisambiguator::new(config.click_window),
            idle: IdleTracker::new(config.idle_check_interval, Instant::now()),
            fullscreen: FullscreenCoordinator::new(),
            preview: ScrubPreview::new(config.preview_bucket, config.preview_size[0] as f32),
            preview_texture: None,
            config,
        })
    }

    /// Switch to a new source. The current video keeps playing until the
    /// new one is ready.
    pub fn load(&mut self, url: impl Into<String>) {
        let url = url.into();
        log::info!("Loading {}", url);
        self.placeholder = Placeholder::Loading(url.clone());
        self.loader.load(url);
    }

    /// Unload the current source and forget any pending one.
    pub fn close(&mut self) {
        self.loader.cancel();
        self.reset_session();
        self.placeholder = Placeholder::Empty;
    }

    pub fn source_url(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.resource.url())
    }

    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.controller.state().is_playing)
    }

    fn reset_session(&mut self) {
        // Stops the players, then releases the resource
        self.session = None;
        self.clicks.cancel();
        self.preview.reset();
        self.preview_texture = None;
    }

    fn poll_source(&mut self, ctx: &Context, now: Instant) {
        match self.loader.poll() {
            Some(SourceEvent::Ready(resource)) => {
                self.reset_session();
                let url = resource.url().to_string();
                match Session::open(resource, ctx, &self.config) {
                    Ok(session) => {
                        log::info!("Ready: {}", url);
                        self.session = Some(session);
                        self.placeholder = Placeholder::Empty;
                        self.notice = None;
                    }
                    Err(e) => {
                        log::warn!("Could not open {}: {}", url, e);
                        self.placeholder = Placeholder::Failed(format!("Failed to open video: {e}"));
                    }
                }
            }
            Some(SourceEvent::Failed { url, error }) => {
                let message = format!("Failed to load {url}: {error}");
                if self.session.is_some() {
                    // The previous video stays on screen
                    self.placeholder = Placeholder::Empty;
                    self.notice = Some(Notice::new(message, now));
                } else {
                    self.placeholder = Placeholder::Failed(message);
                }
            }
            None => {}
        }
    }

    pub fn show(&mut self, ui: &mut Ui) {
        let ctx = ui.ctx().clone();
        let now = Instant::now();

        self.poll_source(&ctx, now);

        let host = ViewportHost::new(&ctx);
        sync_fullscreen(&mut self.fullscreen, &mut self.idle, &host, now);

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        ui.painter().rect_filled(rect, 0.0, Color32::BLACK);

        if ui.rect_contains_pointer(rect) && ctx.input(|i| i.pointer.is_moving()) {
            self.idle.mark_activity();
        }

        let Some(session) = self.session.as_mut() else {
            self.show_placeholder(ui, rect);
            if self.loader.is_loading() {
                ctx.request_repaint_after(FETCH_POLL);
            }
            return;
        };

        let controller = &mut session.controller;
        controller.media_mut().update(&ctx);
        controller.sync_frame();

        let fitted = fit_rect(rect, controller.media().video_size());
        ui.painter().image(
            controller.media().texture().id(),
            fitted,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );

        // Clicks on the picture
        let mut actions = Vec::new();
        if response.clicked() {
            actions.extend(self.clicks.on_click(now));
        }
        actions.extend(self.clicks.poll(now));
        for action in actions {
            match action {
                ClickAction::TogglePlay => controller.toggle_play(),
                ClickAction::ToggleFullscreen => self.fullscreen.toggle(&host),
            }
        }

        // Keyboard, unless a text field has focus
        let text_focus = ctx.wants_keyboard_input();
        let shortcuts = ctx.input(|i| pressed_shortcuts(&i.events, text_focus));
        for shortcut in shortcuts {
            match shortcut {
                Shortcut::TogglePlay => controller.toggle_play(),
                Shortcut::SkipForward => controller.skip(self.config.skip_seconds),
                Shortcut::SkipBackward => controller.skip(-self.config.skip_seconds),
                Shortcut::ExitFullscreen => self.fullscreen.exit(&host),
            }
        }

        let mut hover = None;
        let shown = controls_visible(&mut self.idle, controller.is_dragging(), now);
        if shown {
            let controls = TransportBar::new(controller.state())
                .with_fullscreen(self.fullscreen.is_fullscreen())
                .with_skip_seconds(self.config.skip_seconds)
                .with_height(self.config.controls_height)
                .show(ui, rect);
            apply_controls(&controls, controller, &self.fullscreen, &host);
            hover = controls.timeline_hover.map(|h| (h, controls.bar));
        }
        let held = shown && ctx.input(|i| i.pointer.primary_down());
        controller.release_stale_drag(held);

        // Scrub preview
        let duration = controller.state().duration;
        if let Some(thumbnails) = session.thumbnails.as_mut() {
            match hover {
                Some((h, _)) => self.preview.hover(
                    thumbnails,
                    h.pointer_x - rect.left(),
                    (h.track.left() - rect.left(), h.track.width()),
                    duration,
                    rect.width(),
                ),
                None => self.preview.leave(),
            }
            if self.preview.poll(thumbnails) {
                if let Some(frame) = self.preview.frame() {
                    upload_preview(&ctx, &mut self.preview_texture, frame);
                }
            }
        }
        if let Some((_, bar)) = hover {
            self.paint_preview(ui, rect, bar);
        }
        self.paint_notice(ui, rect, now);

        self.schedule_repaint(&ctx, now);
    }

    fn paint_preview(&self, ui: &Ui, rect: Rect, bar: Rect) {
        if !self.preview.is_visible() {
            return;
        }
        let (Some(texture), Some(time)) = (&self.preview_texture, self.preview.preview_time())
        else {
            return;
        };

        let [w, h] = self.config.preview_size;
        let size = Vec2::new(w as f32, h as f32);
        let center_x = rect.left() + self.preview.offset_x();
        let frame = Rect::from_min_size(
            pos2(center_x - size.x / 2.0, bar.top() - size.y - PREVIEW_GAP),
            size,
        );

        let painter = ui.painter();
        painter.rect_filled(frame.expand(2.0), 2.0, Color32::from_gray(30));
        painter.image(
            texture.id(),
            frame,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );
        painter.text(
            pos2(center_x, frame.bottom() - 4.0),
            Align2::CENTER_BOTTOM,
            format_clock(time),
            FontId::proportional(13.0),
            Color32::WHITE,
        );
    }

    fn paint_notice(&mut self, ui: &Ui, rect: Rect, now: Instant) {
        if !self.notice.as_ref().is_some_and(|n| n.is_active(now)) {
            self.notice = None;
            return;
        }
        let Some(notice) = &self.notice else {
            return;
        };

        let painter = ui.painter();
        let galley = painter.layout_no_wrap(
            notice.message.clone(),
            FontId::proportional(14.0),
            Color32::WHITE,
        );
        let pos = pos2(rect.center().x - galley.size().x / 2.0, rect.top() + 16.0);
        let background = Rect::from_min_size(pos, galley.size()).expand(6.0);
        painter.rect_filled(background, 4.0, Color32::from_rgba_unmultiplied(160, 20, 20, 220));
        painter.galley(pos, galley, Color32::WHITE);
    }

    fn show_placeholder(&self, ui: &mut Ui, rect: Rect) {
        let painter = ui.painter();
        let center = rect.center();
        match &self.placeholder {
            Placeholder::Empty => {
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    "No video loaded",
                    FontId::proportional(20.0),
                    Color32::GRAY,
                );
            }
            Placeholder::Loading(url) => {
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    format!("Loading {url}…"),
                    FontId::proportional(16.0),
                    Color32::GRAY,
                );
            }
            Placeholder::Failed(message) => {
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    message,
                    FontId::proportional(16.0),
                    Color32::RED,
                );
            }
        }
    }

    /// Playback repaints continuously; otherwise wake up for the next timer.
    fn schedule_repaint(&self, ctx: &Context, now: Instant) {
        if self.is_playing() {
            ctx.request_repaint();
            return;
        }

        let mut next = self.idle.next_check();
        if let Some(deadline) = self.clicks.deadline() {
            next = next.min(deadline);
        }
        if let Some(notice) = &self.notice {
            next = next.min(notice.until);
        }
        ctx.request_repaint_after(next.saturating_duration_since(now));

        if self.loader.is_loading() {
            ctx.request_repaint_after(FETCH_POLL);
        }
    }
}

/// Adopt the host's fullscreen status; any change brings the controls back.
fn sync_fullscreen(
    fullscreen: &mut FullscreenCoordinator,
    idle: &mut IdleTracker,
    host: &impl FullscreenHost,
    now: Instant,
) {
    if fullscreen.sync(host) {
        idle.force_visible(now);
    }
}

/// Run the idle check. A drag on the seek bar counts as activity, so the
/// bar stays on screen until it is released.
fn controls_visible(idle: &mut IdleTracker, dragging: bool, now: Instant) -> bool {
    if dragging {
        idle.mark_activity();
    }
    idle.tick(now)
}

fn apply_controls(
    controls: &ControlsResponse,
    controller: &mut PlaybackController<MediaPlayer>,
    fullscreen: &FullscreenCoordinator,
    host: &impl FullscreenHost,
) {
    if controls.toggle_play {
        controller.toggle_play();
    }
    if let Some(delta) = controls.skip {
        controller.skip(delta);
    }
    if controls.toggle_mute {
        controller.toggle_mute();
    }
    if let Some(volume) = controls.volume {
        controller.set_volume(volume);
    }
    if controls.drag_started {
        controller.begin_drag();
    }
    if let Some(time) = controls.dragged_to {
        controller.drag_to(time);
    }
    if controls.drag_stopped {
        controller.end_drag();
    } else if let Some(time) = controls.clicked_at {
        controller.seek_to(time);
    }
    if controls.toggle_fullscreen {
        fullscreen.toggle(host);
    }
}

fn upload_preview(ctx: &Context, texture: &mut Option<TextureHandle>, frame: &PreviewFrame) {
    let image = ColorImage::from_rgba_unmultiplied(
        [frame.width as usize, frame.height as usize],
        &frame.rgba,
    );
    match texture {
        Some(texture) => texture.set(image, TextureOptions::LINEAR),
        None => *texture = Some(ctx.load_texture("cinema_preview", image, TextureOptions::LINEAR)),
    }
}

/// Largest rect of the video's aspect ratio that fits in `area`, centered.
fn fit_rect(area: Rect, video_size: (u32, u32)) -> Rect {
    let (w, h) = video_size;
    if w == 0 || h == 0 || area.height() <= 0.0 {
        return area;
    }
    let aspect = w as f32 / h as f32;
    let area_aspect = area.width() / area.height();

    let size = if aspect > area_aspect {
        Vec2::new(area.width(), area.width() / aspect)
    } else {
        Vec2::new(area.height() * aspect, area.height())
    };
    Rect::from_center_size(area.center(), size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const IDLE: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[derive(Default)]
    struct WindowHost {
        fullscreen: Cell<bool>,
    }

    impl FullscreenHost for WindowHost {
        fn is_fullscreen(&self) -> bool {
            self.fullscreen.get()
        }

        fn request_fullscreen(&self, fullscreen: bool) -> Result<()> {
            self.fullscreen.set(fullscreen);
            Ok(())
        }
    }

    #[test]
    fn test_controls_stay_while_dragging() {
        let start = Instant::now();
        let mut idle = IdleTracker::new(IDLE, start);

        // Pointer held still on the seek bar for well over the idle period
        for step in 1..=4 {
            assert!(controls_visible(&mut idle, true, start + ms(300 * step)));
        }
        // Released: the next quiet checks hide the bar again
        assert!(controls_visible(&mut idle, false, start + ms(1500)));
        assert!(!controls_visible(&mut idle, false, start + ms(2000)));
    }

    #[test]
    fn test_fullscreen_change_brings_controls_back() {
        let start = Instant::now();
        let host = WindowHost::default();
        let mut fullscreen = FullscreenCoordinator::new();
        let mut idle = IdleTracker::new(IDLE, start);
        assert!(!controls_visible(&mut idle, false, start + ms(500)));

        // Window manager enters fullscreen on its own
        host.fullscreen.set(true);
        sync_fullscreen(&mut fullscreen, &mut idle, &host, start + ms(700));
        assert!(fullscreen.is_fullscreen());
        assert!(controls_visible(&mut idle, false, start + ms(700)));
        assert!(controls_visible(&mut idle, false, start + ms(1100)));

        // No change reported: nothing forced
        assert!(!controls_visible(&mut idle, false, start + ms(1200)));
        sync_fullscreen(&mut fullscreen, &mut idle, &host, start + ms(1300));
        assert!(!idle.is_visible());

        fullscreen.toggle(&host);
        sync_fullscreen(&mut fullscreen, &mut idle, &host, start + ms(1400));
        assert!(!fullscreen.is_fullscreen());
        assert!(idle.is_visible());
    }

    #[test]
    fn test_notice_expires() {
        let start = Instant::now();
        let notice = Notice::new("Failed to load b.mp4".into(), start);
        assert!(notice.is_active(start + ms(3900)));
        assert!(!notice.is_active(start + NOTICE_DURATION));
    }

    #[test]
    fn test_fit_rect_letterboxes_wide_video() {
        let area = Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(800.0, 800.0));
        let fitted = fit_rect(area, (1920, 1080));
        assert_eq!(fitted.width(), 800.0);
        assert_eq!(fitted.height(), 450.0);
        assert_eq!(fitted.center(), area.center());
    }

    #[test]
    fn test_fit_rect_pillarboxes_tall_video() {
        let area = Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(1600.0, 900.0));
        let fitted = fit_rect(area, (1080, 1920));
        assert_eq!(fitted.height(), 900.0);
        assert!((fitted.width() - 506.25).abs() < 1e-3);
    }

    #[test]
    fn test_fit_rect_without_size_fills_area() {
        let area = Rect::from_min_size(pos2(10.0, 10.0), Vec2::new(300.0, 200.0));
        assert_eq!(fit_rect(area, (0, 0)), area);
    }
}
