//! Blueprint compliance studio: stage a facility blueprint, review the rooms detected on it,
//! correct them on an interactive overlay, and read back the compliance report.

pub mod app;
pub mod canvas;
pub mod config;
pub mod editor;
pub mod error;
pub mod fixtures;
pub mod flow;
pub mod geometry;
pub mod history;
pub mod mapper;
pub mod overlay;
pub mod preview;
pub mod registry;
pub mod report;
pub mod room;
pub mod runner;
pub mod service;
mod views;

pub use app::BlueprintApp;
pub use config::AppConfig;
pub use flow::{WizardController, WizardStep};
