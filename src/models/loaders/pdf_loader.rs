use crate::error::PaperError;
use crate::models::paper::{file_name_of, Paper, Section};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tracing::{debug, info};

/// 顶层章节标题：可带 `1`、`1.`、`II.` 之类的编号，不匹配 `2.1` 这样的小节
static HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:\d{1,2}\.?|[IVX]{1,5}\.)\s+)?([A-Z][A-Za-z &\-]{2,60})$")
        .expect("章节标题正则非法")
});

static NUMBERED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,2}\.?|[IVX]{1,5}\.)\s+").expect("编号正则非法"));

/// 不带编号时也认作章节标题的名称
const KNOWN_HEADINGS: [&str; 16] = [
    "abstract",
    "introduction",
    "related work",
    "background",
    "preliminaries",
    "method",
    "methods",
    "methodology",
    "approach",
    "experiments",
    "results",
    "discussion",
    "conclusion",
    "conclusions",
    "references",
    "acknowledgments",
];

/// 论文来源：给定路径，产出标题和章节
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Paper, PaperError>;
}

/// 基于 `pdf-extract` 的论文来源
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfPaperSource;

#[async_trait]
impl PaperSource for PdfPaperSource {
    async fn load(&self, path: &Path) -> Result<Paper, PaperError> {
        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
            .await
            .map_err(|e| PaperError::Extraction {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .map_err(|e| PaperError::Extraction {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let (title, sections) = split_sections(&text);
        let title = title.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        });

        debug!(
            "{} 提取到 {} 个章节: {:?}",
            file_name_of(path),
            sections.len(),
            sections.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Paper::new(title, sections, path))
    }
}

/// 识别章节标题，返回规范化后的名称
fn heading_name(line: &str) -> Option<String> {
    let caps = HEADING_REGEX.captures(line)?;
    let raw = caps.get(1)?.as_str().trim();
    let lower = raw.to_ascii_lowercase();

    let numbered = NUMBERED_REGEX.is_match(line);
    let known = KNOWN_HEADINGS.contains(&lower.as_str());
    if !numbered && !known {
        return None;
    }

    let name = if lower.starts_with("conclusion") {
        "Conclusion".to_string()
    } else if raw.chars().all(|c| !c.is_ascii_lowercase()) {
        title_case(&lower)
    } else {
        raw.to_string()
    };
    Some(name)
}

fn title_case(lower: &str) -> String {
    lower
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 把全文切分为标题和章节
///
/// 第一行非空文本视为标题；标题之后、第一个章节标题之前的内容
/// 在没有显式 Abstract 时作为 Abstract。
pub fn split_sections(text: &str) -> (Option<String>, Vec<Section>) {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();

    let title = match lines.peek() {
        Some(first) if heading_name(first).is_none() => lines.next().map(str::to_string),
        _ => None,
    };

    let mut preamble = String::new();
    let mut sections: Vec<Section> = Vec::new();

    for line in lines {
        if let Some(name) = heading_name(line) {
            if sections.iter().any(|s| s.name == name) {
                // 重复标题（页眉、目录等）并入当前章节
                append_line(sections.last_mut().map(|s| &mut s.text).unwrap_or(&mut preamble), line);
            } else {
                sections.push(Section::new(name, String::new()));
            }
            continue;
        }
        match sections.last_mut() {
            Some(section) => append_line(&mut section.text, line),
            None => append_line(&mut preamble, line),
        }
    }

    if !preamble.is_empty() && !sections.iter().any(|s| s.name == "Abstract") {
        sections.insert(0, Section::new("Abstract", preamble));
    }

    (title, sections)
}

fn append_line(buf: &mut String, line: &str) {
    // 行尾连字符断词直接拼接
    if buf.ends_with('-') {
        buf.pop();
    } else if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(line);
}

/// 查找待审论文
///
/// 以 `.pdf` 结尾的路径视为单篇论文；目录则递归查找其中所有 PDF，
/// 同一目录内按文件名排序。
pub async fn discover_papers(paper_path: &Path) -> Result<Vec<PathBuf>, PaperError> {
    if is_pdf(paper_path) {
        if !paper_path.is_file() {
            return Err(PaperError::NotFound(paper_path.to_path_buf()));
        }
        return Ok(vec![paper_path.to_path_buf()]);
    }
    if !paper_path.exists() {
        return Err(PaperError::NotFound(paper_path.to_path_buf()));
    }
    if !paper_path.is_dir() {
        return Err(PaperError::NotPaperSource(paper_path.to_path_buf()));
    }

    let mut found = Vec::new();
    let mut pending = vec![paper_path.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(|source| PaperError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        let mut subdirs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| PaperError::Io {
            path: dir.clone(),
            source,
        })? {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            } else if is_pdf(&path) {
                files.push(path);
            }
        }

        info!("扫描目录: {} | PDF: {} | 子目录: {}", dir.display(), files.len(), subdirs.len());

        files.sort();
        found.extend(files);
        // 逆序入栈，保证子目录按名称顺序处理
        subdirs.sort();
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(found)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
