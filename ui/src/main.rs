#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use rollcall_business::BusinessConfig;
use rollcall_ui::state::State;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> eframe::Result {
    // Log to stderr (if you run with `RUST_LOG=debug`).
    env_logger::Builder::from_env(env_logger::Env::default()).init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 640.0])
            .with_min_inner_size([360.0, 480.0]),
        ..Default::default()
    };

    let api_base =
        std::env::var("ROLLCALL_API").unwrap_or_else(|_| "http://127.0.0.1:5000".to_owned());
    log::info!("kiosk backend at {api_base}");

    eframe::run_native(
        "Rollcall",
        native_options,
        Box::new(move |_cc| {
            let state = State::new(BusinessConfig::new(api_base));
            Ok(Box::new(rollcall_ui::RollcallApp::new(state)))
        }),
    )
}
