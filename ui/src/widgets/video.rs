//! Live camera preview, shown only while a capture step wants it.

use egui::{ColorImage, TextureHandle, TextureOptions, Ui};
use rollcall_business::VideoFeed;

/// Paints the current frame when the feed is visible.
///
/// The texture handle is owned by the caller and reused across frames so
/// the preview does not allocate a new GPU texture per repaint.
pub fn video_preview(feed: &VideoFeed, texture: &mut Option<TextureHandle>, ui: &mut Ui) {
    if !feed.is_visible() {
        return;
    }
    let Some(frame) = feed.latest_frame() else {
        ui.label("Camera offline");
        return;
    };

    let image = ColorImage::from_rgb([frame.width as usize, frame.height as usize], &frame.rgb);
    let texture = match texture {
        Some(texture) => {
            texture.set(image, TextureOptions::LINEAR);
            texture
        }
        None => texture.insert(ui.ctx().load_texture(
            "video-preview",
            image,
            TextureOptions::LINEAR,
        )),
    };
    ui.add(egui::Image::new((texture.id(), texture.size_vec2())).max_width(320.0));
}
