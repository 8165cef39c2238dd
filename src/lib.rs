#![warn(clippy::all, rust_2018_idioms)]

mod app;
mod audio;
mod cadence;
pub mod config;
mod gui;

pub use app::App;
