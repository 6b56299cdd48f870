//! Transient status text under the flow controls.

use egui::{Color32, Ui};
use rollcall_business::{FACE_CAPTURED, MARKED_PRESENT};

/// Green color for success status
pub const COLOR_GREEN: Color32 = Color32::from_rgb(34, 139, 34);
/// Red color for error status
pub const COLOR_RED: Color32 = Color32::from_rgb(220, 53, 69);

/// Renders one status line; empty text renders nothing.
///
/// Transport failures show as the literal `Error` in red, positive
/// outcomes in green, everything else in the default text color.
pub fn status_label(ui: &mut Ui, text: &str) {
    if text.is_empty() {
        return;
    }
    let color = if text == "Error" {
        COLOR_RED
    } else if text.contains(MARKED_PRESENT) || text == FACE_CAPTURED {
        COLOR_GREEN
    } else {
        ui.visuals().text_color()
    };
    ui.colored_label(color, text);
}
