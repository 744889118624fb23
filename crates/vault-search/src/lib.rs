//! # vault-search
//!
//! Search over a docvault owner's corpus: free text plus optional structured
//! filters, an explicit sort, pagination with a total match count, and an
//! in-process result cache invalidated per owner.

pub mod cache;
pub mod engine;

pub use cache::SearchCache;
pub use engine::SearchEngine;
