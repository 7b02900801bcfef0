//! Milkslip Processing Library
//!
//! Image normalization for captured receipt photos: decode, bounded resize,
//! and JPEG re-encode ahead of upload and vision extraction.

pub mod normalize;

pub use normalize::{ImageNormalizer, NormalizedImage};
