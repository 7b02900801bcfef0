//! Domain models shared across all milkslip components.

pub mod breeding;
pub mod extraction;
pub mod profile;
pub mod receipt;

pub use breeding::BreedingRecord;
pub use extraction::{Extraction, ExtractionFields, ExtractionSource};
pub use profile::{Profile, Role};
pub use receipt::{CanonicalReceipt, ReceiptDraft, MANUAL_IMAGE_REF};
