//! # vault-jobs
//!
//! Text extraction and the document intake pipeline.
//!
//! - [`ExtractionRegistry`] maps an [`ExtractionStrategy`](vault_core::ExtractionStrategy)
//!   to its adapter (plain text, `pdftotext`, OCR service).
//! - [`TextExtractor`] dispatches by media type under a timeout and degrades
//!   to empty text on any failure.
//! - [`IntakePipeline`] runs rate limit, screening, extraction,
//!   classification and persistence for an upload, and handles deletes.

pub mod adapters;
pub mod extraction;
pub mod extractor;
pub mod intake;

pub use extraction::ExtractionRegistry;
pub use extractor::TextExtractor;
pub use intake::{DeleteOutcome, IntakeDeps, IntakePipeline, UploadOutcome, RATE_LIMIT_EXCEEDED};
