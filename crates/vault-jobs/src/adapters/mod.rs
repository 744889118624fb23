//! Extraction adapter implementations.

pub mod ocr;
pub mod pdf_text;
pub mod text_native;

pub use ocr::OcrServiceAdapter;
pub use pdf_text::PdfTextAdapter;
pub use text_native::TextNativeAdapter;
