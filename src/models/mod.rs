pub mod loaders;
pub mod paper;

pub use loaders::{discover_papers, PaperSource, PdfPaperSource};
pub use paper::{Paper, Section};
