//! Enrollment page: identity form, card scan, face capture, submit.

use egui::{Button, Response, Ui};

use crate::state::State;
use crate::widgets::{self, status::COLOR_RED};

/// Renders the enrollment flow.
pub fn enroll_page(state: &mut State, ui: &mut Ui) -> Response {
    // Clones share the flow's state; this avoids borrowing `state` twice
    // when the video preview needs its texture slot.
    let flow = state.enroll.clone();

    let response = ui
        .vertical(|ui| {
            ui.heading("Enroll a student");
            ui.add_space(8.0);

            let form = flow.form();
            let errors = flow.field_errors();
            let mut roll = form.roll.clone();
            let mut name = form.name.clone();
            let mut email = form.email.clone();

            ui.horizontal(|ui| {
                ui.label("Roll:");
                ui.text_edit_singleline(&mut roll);
            });
            if let Some(error) = errors.roll {
                ui.colored_label(COLOR_RED, error);
            }

            ui.horizontal(|ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut name);
            });
            if let Some(error) = errors.name {
                ui.colored_label(COLOR_RED, error);
            }

            ui.horizontal(|ui| {
                ui.label("Email:");
                ui.text_edit_singleline(&mut email);
            });
            if let Some(error) = errors.email {
                ui.colored_label(COLOR_RED, error);
            }

            if roll != form.roll {
                flow.set_roll(roll);
            }
            if name != form.name {
                flow.set_name(name);
            }
            if email != form.email {
                flow.set_email(email);
            }

            ui.add_space(12.0);

            if ui
                .add_enabled(flow.can_scan(), Button::new("Scan RFID"))
                .clicked()
            {
                flow.scan();
            }
            widgets::status_label(ui, &flow.scan_status.get());

            ui.add_space(8.0);

            if ui
                .add_enabled(flow.can_capture(), Button::new("Capture face"))
                .clicked()
            {
                flow.capture();
            }
            widgets::status_label(ui, &flow.face_status.get());
        })
        .response;

    widgets::video_preview(&state.video, &mut state.preview, ui);

    ui.add_space(8.0);
    if ui
        .add_enabled(state.enroll.can_submit(), Button::new("Submit"))
        .clicked()
    {
        state.enroll.submit();
    }
    widgets::status_label(ui, &state.enroll.result.get());

    response
}
