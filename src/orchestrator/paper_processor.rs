//! 单篇论文处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **读取模板**：每篇论文都重新读取审稿格式模板
//! 2. **构建提示词**：委托 `PromptBuilder`
//! 3. **请求审稿**：委托 `ReviewClient`（密钥轮换 + 重试）
//! 4. **写入结果**：委托 `ReviewWriter`

use crate::config::Config;
use crate::models::Paper;
use crate::services::{ChatBackend, Language, PromptBuilder, ReviewClient, ReviewWriter};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// 单篇论文审稿流程
///
/// - 持有提示词构建器、审稿客户端和结果写入器
/// - 不关心论文从哪里加载，也不关心批次
pub struct PaperReviewer<B: ChatBackend> {
    prompt_builder: PromptBuilder,
    client: ReviewClient<B>,
    writer: ReviewWriter,
    research_fields: String,
    language: Language,
    review_format_file: PathBuf,
}

impl<B: ChatBackend> PaperReviewer<B> {
    pub fn new(
        config: &Config,
        prompt_builder: PromptBuilder,
        client: ReviewClient<B>,
        writer: ReviewWriter,
    ) -> Self {
        Self {
            prompt_builder,
            client,
            writer,
            research_fields: config.research_fields.clone(),
            language: config.language,
            review_format_file: config.review_format_file.clone(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.writer.output_dir()
    }

    /// 开始新批次，同名结果文件重新从头写
    pub fn begin_batch(&mut self) {
        self.writer.begin_batch();
    }

    /// 审阅单篇论文
    ///
    /// # 参数
    /// - `paper`: 论文
    /// - `paper_index`: 论文序号（从 1 开始，写入结果标题）
    ///
    /// # 返回
    /// 返回写入的结果文件路径
    pub async fn review(&mut self, paper: &Paper, paper_index: usize) -> Result<PathBuf> {
        let review_format = read_review_format(&self.review_format_file).await?;

        let prompt = self
            .prompt_builder
            .build(paper, &self.research_fields, self.language, &review_format)
            .with_context(|| format!("[论文 {}] 构建提示词失败", paper_index))?;
        debug!(
            "[论文 {}] 提示词就绪：system {} 字符，user {} 字符",
            paper_index,
            prompt.system.len(),
            prompt.user.len()
        );

        let reply = self
            .client
            .review(&prompt)
            .await
            .with_context(|| format!("[论文 {}] 审稿请求失败", paper_index))?;
        info!(
            "[论文 {}] 审稿完成，共尝试 {} 次",
            paper_index, reply.attempts
        );

        let path = self
            .writer
            .write(paper_index, &paper.title, &reply.text)
            .with_context(|| format!("[论文 {}] 写入审稿结果失败", paper_index))?;

        Ok(path)
    }
}

/// 读取审稿格式模板（不缓存，模板可在运行中修改）
async fn read_review_format(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取审稿格式模板: {}", path.display()))
}
