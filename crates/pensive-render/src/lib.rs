//! # pensive-render
//!
//! The render collaborator for Pensive: draws one full-size PNG and one
//! thumbnail per subnet window and optionally appends raw samples to
//! per-channel data files.

pub mod data;
pub mod layout;
pub mod pipeline;
pub mod plot;

pub use layout::OutputLayout;
pub use pipeline::{PngPipeline, PngPipelineFactory};
