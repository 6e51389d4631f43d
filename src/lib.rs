//! # Paper Reviewer
//!
//! 读取 PDF 论文，调用 LLM 聊天接口生成结构化审稿意见，每篇论文写入一个结果文件。
//!
//! ## 架构设计
//!
//! ### ① 模型层（Models）
//! - `models/` - `Paper` / `Section`，以及从 PDF 加载论文的 `PaperSource`
//!
//! ### ② 业务能力层（Services）
//! - `KeyRotator` - API 密钥轮换
//! - `PromptBuilder` - 提示词构建与 token 截断
//! - `RetryPolicy` - 指数退避重试
//! - `ReviewClient` - 调用聊天接口
//! - `ReviewWriter` - 写审稿结果文件
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 发现论文、逐篇处理、汇总统计
//! - `orchestrator/paper_processor` - 单篇论文的审稿流程

pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use cli::Cli;
pub use config::Config;
pub use error::{ConfigError, OutputError, PaperError, ReviewError};
pub use models::{Paper, Section};
pub use orchestrator::{App, PaperReviewer, ProcessingStats};
