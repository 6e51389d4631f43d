pub mod pdf_loader;

pub use pdf_loader::{discover_papers, split_sections, PaperSource, PdfPaperSource};
