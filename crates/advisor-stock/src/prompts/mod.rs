//! Prompt templates for stock recommendations
//!
//! - `system`: the analyst persona sent as the system message
//! - `user`: the analysis request built around a quote snapshot

mod system;
mod user;

pub use system::analyst_persona;
pub use user::{AnalysisContext, analysis_prompt};
