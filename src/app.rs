use egui::{CentralPanel, Frame, Key, TextEdit, TopBottomPanel};
use egui_cinema::PlayerView;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "flv", "wmv"];

pub struct CinemaApp {
    view: PlayerView,
    url_input: String,
}

impl CinemaApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, mut view: PlayerView, source: Option<String>) -> Self {
        if let Some(source) = source {
            view.load(source);
        }
        Self {
            view,
            url_input: String::new(),
        }
    }

    fn open_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video", VIDEO_EXTENSIONS)
            .pick_file()
        {
            self.view.load(path.display().to_string());
        }
    }

    fn open_url(&mut self) {
        let url = self.url_input.trim();
        if !url.is_empty() {
            self.view.load(url.to_string());
        }
    }
}

impl eframe::App for CinemaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let fullscreen = ctx.input(|i| i.viewport().fullscreen).unwrap_or(false);

        if !fullscreen {
            TopBottomPanel::top("menu_bar").show(ctx, |ui| {
                egui::menu::bar(ui, |ui| {
                    ui.menu_button("File", |ui| {
                        if ui.button("Open...").clicked() {
                            ui.close_menu();
                            self.open_file();
                        }
                        if ui.button("Close").clicked() {
                            ui.close_menu();
                            self.view.close();
                        }
                        if ui.button("Quit").clicked() {
                            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });

                    ui.separator();
                    ui.label("URL");
                    let field = ui.add(
                        TextEdit::singleline(&mut self.url_input)
                            .hint_text("https://… or a file path")
                            .desired_width(360.0),
                    );
                    let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
                    if ui.button("Load").clicked() || submitted {
                        self.open_url();
                    }
                });
            });
        }

        CentralPanel::default()
            .frame(Frame::none())
            .show(ctx, |ui| self.view.show(ui));

        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.view.load(path.display().to_string());
        }
    }
}
