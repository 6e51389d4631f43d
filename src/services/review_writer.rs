//! 审稿结果写入服务 - 业务能力层
//!
//! 只负责"把一篇论文的审稿意见写到文件"，不关心流程

use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::OutputError;

/// 文件名中不允许出现的字符
const INVALID_TITLE_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 把标题中的非法字符替换为下划线
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if INVALID_TITLE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// 输出文件名：`<YYYY-MM-DD-HH>-<标题>.<扩展名>`
pub fn output_file_name(now: &DateTime<Local>, title: &str, file_format: &str) -> String {
    format!(
        "{}-{}.{}",
        now.format("%Y-%m-%d-%H"),
        sanitize_title(title),
        file_format
    )
}

/// 单篇论文的审稿结果内容
pub fn format_review(paper_index: usize, review: &str) -> String {
    format!("## Paper: {}\n\n\n\n\n{}", paper_index, review)
}

/// 审稿结果写入服务
///
/// 同一批次内首次写某个文件时覆盖，之后若有论文映射到同名文件则追加。
/// 每个批次开始前调用 `begin_batch`，上一批次写过的文件会重新被覆盖。
pub struct ReviewWriter {
    output_dir: PathBuf,
    file_format: String,
    written: HashSet<PathBuf>,
}

impl ReviewWriter {
    pub fn new(output_dir: impl Into<PathBuf>, file_format: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_format: file_format.into(),
            written: HashSet::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 开始新批次，清空已写文件记录
    pub fn begin_batch(&mut self) {
        self.written.clear();
    }

    /// 以当前时间写入
    pub fn write(
        &mut self,
        paper_index: usize,
        title: &str,
        review: &str,
    ) -> Result<PathBuf, OutputError> {
        self.write_at(&Local::now(), paper_index, title, review)
    }

    /// 写入审稿结果
    ///
    /// # 参数
    /// - `now`: 用于生成文件名的时间
    /// - `paper_index`: 论文序号（从 1 开始）
    /// - `title`: 论文标题
    /// - `review`: 审稿意见
    ///
    /// # 返回
    /// 返回写入的文件路径
    pub fn write_at(
        &mut self,
        now: &DateTime<Local>,
        paper_index: usize,
        title: &str,
        review: &str,
    ) -> Result<PathBuf, OutputError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| OutputError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self
            .output_dir
            .join(output_file_name(now, title, &self.file_format));
        let append = self.written.contains(&path);

        debug!(
            "写入审稿结果: {} | 模式: {}",
            path.display(),
            if append { "追加" } else { "覆盖" }
        );

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(|source| OutputError::Write {
                path: path.clone(),
                source,
            })?;

        let content = if append {
            format!("\n{}", format_review(paper_index, review))
        } else {
            format_review(paper_index, review)
        };
        file.write_all(content.as_bytes())
            .map_err(|source| OutputError::Write {
                path: path.clone(),
                source,
            })?;

        self.written.insert(path.clone());
        Ok(path)
    }
}
