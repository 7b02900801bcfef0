//! Milkslip Vision Library
//!
//! Vision-LLM extraction of structured values from receipt photos: the
//! Anthropic Messages API client, the fixed instruction prompt, and the
//! best-effort JSON payload isolation.

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::VisionExtractor;
pub use parse::parse_fields;
pub use prompt::extraction_prompt;
