//! Attendance page: card scan, then joint card+face verification.

use egui::{Button, Response, Ui};

use crate::state::State;
use crate::widgets;

/// Renders the attendance flow.
pub fn attendance_page(state: &mut State, ui: &mut Ui) -> Response {
    let flow = state.attendance.clone();

    let response = ui
        .vertical(|ui| {
            ui.heading("Mark attendance");
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(flow.can_scan(), Button::new("Scan RFID"))
                    .clicked()
                {
                    flow.scan();
                }
                if ui
                    .add_enabled(flow.can_verify(), Button::new("Verify face"))
                    .clicked()
                {
                    flow.verify();
                }
            });

            ui.add_space(8.0);
            widgets::status_label(ui, &flow.message.get());
        })
        .response;

    widgets::video_preview(&state.video, &mut state.preview, ui);

    response
}
