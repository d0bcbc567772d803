//! Headless playback harness.
//!
//! - [`HeadlessRunner`] plays a scenario to completion on a manual scheduler
//! - [`RunReport`] captures the run as JSON

mod headless;
mod report;

pub use headless::{HeadlessConfig, HeadlessController, HeadlessRunner};
pub use report::RunReport;
