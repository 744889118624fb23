//! # vault-inference
//!
//! Document classification for docvault.
//!
//! Two scorers run over a document's name and extracted text: a keyword
//! scorer with fixed per-category lists, and a [`FeatureScorer`] (a seeded
//! term-fraction heuristic today, a trained model later). Their confidences
//! are blended into one category, alongside keyword extraction, document
//! kind detection and language detection.
//!
//! ```rust,no_run
//! use vault_inference::{ClassificationEngine, ClassifierConfig};
//!
//! # async fn example() -> vault_core::Result<()> {
//! let engine = ClassificationEngine::heuristic(ClassifierConfig::from_env()?);
//! let result = engine
//!     .classify("bank_statement.pdf", "application/pdf", "account balance statement bank")
//!     .await;
//! assert_eq!(result.category.as_str(), "financial");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod feature;
pub mod keyword;
pub mod kind;
pub mod language;
pub mod vocabulary;

pub use config::ClassifierConfig;
pub use engine::ClassificationEngine;
pub use feature::{FeatureScore, FeatureScorer, HeuristicFeatureScorer};
pub use keyword::{score_keywords, KeywordScore};
pub use kind::detect_kind;
pub use language::detect_language;
