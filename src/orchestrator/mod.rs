//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PathBuf>，发现 → 加载 → 统计)
//!     ↓
//! paper_processor (处理单篇 Paper：模板 → 提示词 → 审稿 → 写入)
//!     ↓
//! services (能力层：prompt_builder / review_service / review_writer)
//! ```
//!
//! 编排层只做调度和统计，不做具体业务判断。

pub mod batch_processor;
pub mod paper_processor;

pub use batch_processor::{App, ProcessingStats};
pub use paper_processor::PaperReviewer;
