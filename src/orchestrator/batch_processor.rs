//! 批量论文处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量论文的审稿和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、读取密钥、创建分词器和审稿客户端
//! 2. **论文发现**：单个 PDF 或递归扫描目录
//! 3. **顺序处理**：逐篇加载、审稿、写入
//! 4. **失败隔离**：单篇失败只记录，不影响后续论文
//! 5. **全局统计**：汇总成功/失败数量和总耗时

use crate::config::Config;
use crate::models::{discover_papers, PaperSource, PdfPaperSource};
use crate::orchestrator::paper_processor::PaperReviewer;
use crate::services::{
    ChatBackend, KeyRotator, OpenAiBackend, PromptBuilder, ReviewClient, ReviewWriter,
};
use crate::utils::logging;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, warn};

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    /// 成功写入的结果文件
    pub outputs: Vec<PathBuf>,
}

/// 应用主结构
pub struct App<S: PaperSource, B: ChatBackend> {
    config: Config,
    source: S,
    reviewer: PaperReviewer<B>,
}

impl App<PdfPaperSource, OpenAiBackend> {
    /// 初始化应用
    ///
    /// 配置错误（没有密钥、模板缺失）在这里直接失败，不会进入审稿流程。
    pub fn initialize(config: Config) -> Result<Self> {
        let backend = OpenAiBackend::new(&config);
        Self::with_parts(config, PdfPaperSource, backend)
    }
}

impl<S: PaperSource, B: ChatBackend> App<S, B> {
    /// 用指定的论文来源和 LLM 接口组装应用
    pub fn with_parts(config: Config, source: S, backend: B) -> Result<Self> {
        let keys = config.validate().context("配置校验失败")?;
        logging::log_startup(&config, keys.len());

        let rotator = KeyRotator::new(keys, config.key_wrap)?;
        let client = ReviewClient::new(backend, rotator, config.retry_policy());
        let prompt_builder = PromptBuilder::new(config.token_budget()).context("分词器初始化失败")?;
        let writer = ReviewWriter::new(&config.output_dir, &config.file_format);
        let reviewer = PaperReviewer::new(&config, prompt_builder, client, writer);

        Ok(Self {
            config,
            source,
            reviewer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<ProcessingStats> {
        let started = Instant::now();
        self.reviewer.begin_batch();

        let papers = discover_papers(&self.config.paper_path)
            .await
            .with_context(|| format!("无法查找论文: {}", self.config.paper_path.display()))?;

        if papers.is_empty() {
            warn!("⚠️ 没有找到待审的 PDF 文件，程序结束");
            return Ok(ProcessingStats::default());
        }
        logging::log_papers_found(&papers);

        let mut stats = ProcessingStats {
            total: papers.len(),
            ..Default::default()
        };

        for (index, path) in papers.iter().enumerate() {
            let paper_index = index + 1;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            logging::log_paper_start(paper_index, stats.total, &file_name);

            let paper = match self.source.load(path).await {
                Ok(paper) => paper,
                Err(e) => {
                    error!("[论文 {}] ❌ 加载失败: {}", paper_index, e);
                    stats.failed += 1;
                    continue;
                }
            };

            match self.reviewer.review(&paper, paper_index).await {
                Ok(output) => {
                    logging::log_paper_done(paper_index, &paper.title, &output);
                    stats.success += 1;
                    stats.outputs.push(output);
                }
                Err(e) => {
                    error!("[论文 {}] ❌ 审稿失败: {:#}", paper_index, e);
                    stats.failed += 1;
                }
            }
        }

        logging::print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            started.elapsed(),
            self.reviewer.output_dir(),
        );

        Ok(stats)
    }
}
