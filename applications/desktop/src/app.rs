//! Audiobook player window

use crate::view::{ViewState, WindowView};
use directories::UserDirs;
use eframe::egui::{self, Button, Vec2};
use narrator_playback::{Controls, Intent, Player, ResumeOffer};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::path::PathBuf;
use std::sync::Arc;

pub const WINDOW_TITLE: &str = "Audiobook player";
pub const WINDOW_SIZE: [f32; 2] = [600.0, 700.0];
const COVER_SIZE: f32 = 500.0;
const PROGRESS_WIDTH: f32 = 600.0;

const RESUME_LABEL: &str = "Resume";
const START_OVER_LABEL: &str = "Start Over";

pub struct NarratorApp {
    player: Player,
    view: Arc<WindowView>,
    resume_offer: Option<ResumeOffer>,
}

impl NarratorApp {
    /// `build` receives the window's view and returns the player driving it
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        build: impl FnOnce(Arc<WindowView>) -> Player,
    ) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let view = Arc::new(WindowView::new(cc.egui_ctx.clone()));
        let mut player = build(Arc::clone(&view));
        let resume_offer = player.startup();

        Self {
            player,
            view,
            resume_offer,
        }
    }

    /// Ask whether to continue the last session
    fn offer_resume(&mut self, offer: &ResumeOffer) {
        let answer = MessageDialog::new()
            .set_title("Resume Playback")
            .set_description(format!("Resume playback from {}?", offer.file_name))
            .set_buttons(MessageButtons::OkCancelCustom(
                RESUME_LABEL.to_string(),
                START_OVER_LABEL.to_string(),
            ))
            .show();

        let resume = match answer {
            MessageDialogResult::Custom(label) => label == RESUME_LABEL,
            MessageDialogResult::Ok | MessageDialogResult::Yes => true,
            _ => false,
        };

        if resume {
            if let Err(e) = self.player.accept_resume(offer) {
                tracing::warn!("Resume failed: {}", e);
            }
        } else if let Err(e) = self.player.decline_resume() {
            tracing::warn!("Failed to clear saved session: {}", e);
        }
    }

    fn show_errors(&self) {
        for message in self.view.take_errors() {
            MessageDialog::new()
                .set_level(MessageLevel::Error)
                .set_title("Error")
                .set_description(message)
                .set_buttons(MessageButtons::Ok)
                .show();
        }
    }

    fn pick_file() -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Open MP3 File")
            .add_filter("MP3 files", &["mp3"]);
        if let Some(dirs) = UserDirs::new() {
            dialog = dialog.set_directory(dirs.home_dir());
        }
        dialog.pick_file()
    }

    fn draw(ui: &mut egui::Ui, state: &ViewState) -> Option<Intent> {
        let mut intent = None;

        ui.vertical_centered(|ui| {
            if ui.button("Open MP3 File").clicked() {
                if let Some(path) = Self::pick_file() {
                    intent = Some(Intent::Open(path));
                }
            }

            ui.label(state.status.as_str());

            let cover = Vec2::splat(COVER_SIZE);
            match &state.cover {
                Some(path) => {
                    ui.add(
                        egui::Image::new(format!("file://{}", path.display()))
                            .fit_to_exact_size(cover),
                    );
                }
                None => {
                    ui.allocate_space(cover);
                }
            }

            ui.add(egui::ProgressBar::new(state.fraction).desired_width(PROGRESS_WIDTH));

            ui.horizontal(|ui| {
                ui.label(state.current.as_str());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(state.total.as_str());
                });
            });

            if let Some(clicked) = transport_row(ui, state.controls) {
                intent = Some(clicked);
            }
            if let Some(clicked) = speed_row(ui, state.controls) {
                intent = Some(clicked);
            }
        });

        intent
    }
}

fn control(ui: &mut egui::Ui, enabled: bool, label: &str, intent: Intent) -> Option<Intent> {
    ui.add_enabled(enabled, Button::new(label))
        .clicked()
        .then_some(intent)
}

fn transport_row(ui: &mut egui::Ui, c: Controls) -> Option<Intent> {
    ui.horizontal(|ui| {
        [
            control(ui, c.volume_down, "Vol -", Intent::VolumeDown),
            control(ui, c.skip_back, "<< 30s", Intent::SkipBack),
            control(ui, c.play, "Play", Intent::Play),
            control(ui, c.pause, "Pause", Intent::Pause),
            control(ui, c.skip_forward, "30s >>", Intent::SkipForward),
            control(ui, c.volume_up, "Vol +", Intent::VolumeUp),
        ]
        .into_iter()
        .flatten()
        .next()
    })
    .inner
}

fn speed_row(ui: &mut egui::Ui, c: Controls) -> Option<Intent> {
    ui.horizontal(|ui| {
        [
            control(ui, c.speed_down, "Decrease speed", Intent::SpeedDown),
            control(ui, c.speed_up, "Increase speed", Intent::SpeedUp),
        ]
        .into_iter()
        .flatten()
        .next()
    })
    .inner
}

impl eframe::App for NarratorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(offer) = self.resume_offer.take() {
            self.offer_resume(&offer);
        }
        self.show_errors();

        let state = self.view.snapshot();
        let intent = egui::CentralPanel::default()
            .show(ctx, |ui| Self::draw(ui, &state))
            .inner;

        if let Some(intent) = intent {
            self.player.handle(intent);
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            self.player.close();
        }
    }
}
