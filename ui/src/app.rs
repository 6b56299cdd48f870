use std::time::Duration;

use crate::pages;
use crate::state::{Page, State};

pub struct RollcallApp {
    state: State,
}

impl RollcallApp {
    /// Called once before the first frame.
    pub fn new(state: State) -> Self {
        Self { state }
    }
}

impl eframe::App for RollcallApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Countdown ticks, auto-clears, and remote completions land
        // between frames; keep repainting so they show up promptly.
        ctx.request_repaint_after(Duration::from_millis(150));

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Rollcall");
                ui.separator();
                ui.selectable_value(&mut self.state.page, Page::Attendance, "Attendance");
                ui.selectable_value(&mut self.state.page, Page::Enroll, "Enroll");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.state.page {
            Page::Attendance => {
                pages::attendance_page(&mut self.state, ui);
            }
            Page::Enroll => {
                pages::enroll_page(&mut self.state, ui);
            }
        });
    }
}
