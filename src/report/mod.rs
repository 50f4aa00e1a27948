//! Report module - terminal output of the computed structures

mod records;
mod renderer;

pub use records::{records_frame, write_records_csv};
pub use renderer::TextRenderer;
