//! 日志工具模块
//!
//! 提供审稿流程各阶段的日志输出

use crate::config::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// 记录程序启动信息
pub fn log_startup(config: &Config, key_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 论文审稿启动");
    info!("📂 论文路径: {}", config.paper_path.display());
    info!("🔬 研究领域: {}", config.research_fields);
    info!("🌐 输出语言: {}", config.language);
    info!("🤖 模型: {} | 可用密钥: {} 个", config.llm_model_name, key_count);
    info!("{}", "=".repeat(60));
}

/// 记录找到的论文列表
pub fn log_papers_found(papers: &[PathBuf]) {
    info!("{} paper_num: {} {}", "-".repeat(18), papers.len(), "-".repeat(18));
    for (index, path) in papers.iter().enumerate() {
        info!("{} {}", index, path.display());
    }
}

/// 记录单篇论文开始处理
pub fn log_paper_start(paper_index: usize, total: usize, file_name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📄 [论文 {}/{}] {}", paper_index, total, file_name);
}

/// 记录单篇论文处理完成
pub fn log_paper_done(paper_index: usize, title: &str, output: &Path) {
    info!("✓ [论文 {}] {} → {}", paper_index, truncate_text(title, 60), output.display());
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `elapsed`: 总耗时
/// - `output_dir`: 输出目录
pub fn print_final_stats(success: usize, failed: usize, total: usize, elapsed: Duration, output_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("⏱ review time: {:.1} s", elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
    info!("\n审稿结果已保存至: {}", output_dir.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
