#![warn(clippy::all, rust_2018_idioms)]

//! egui front end for the Rollcall kiosk.

pub mod app;
pub mod camera;
pub mod pages;
pub mod state;
pub mod widgets;

pub use app::RollcallApp;
