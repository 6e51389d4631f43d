//! 审稿提示词构建
//!
//! 系统提示词：审稿人角色 + 审稿格式模板 + 输出语言。
//! 用户提示词：按固定顺序拼接论文章节，并截断到 token 预算以内。

use crate::error::{ConfigError, PaperError};
use crate::models::Paper;
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// 审稿意见的输出语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// `en` 为英文，其余一律为中文
    pub fn from_arg(arg: &str) -> Self {
        if arg == "en" {
            Self::English
        } else {
            Self::Chinese
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Chinese => write!(f, "Chinese"),
        }
    }
}

/// 截断方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationMode {
    /// 按 token 精确截断
    #[default]
    Exact,
    /// 按 token/字符 平均密度换算字符数后截断
    CharRatio,
}

impl FromStr for TruncationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "char_ratio" | "char-ratio" => Ok(Self::CharRatio),
            other => Err(ConfigError::InvalidValue {
                key: "TRUNCATION_MODE",
                value: other.to_string(),
            }),
        }
    }
}

/// token 预算：总上限减去系统提示词预留，剩下的给论文正文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub max_tokens: usize,
    pub prompt_reserve: usize,
    pub mode: TruncationMode,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            prompt_reserve: 1000,
            mode: TruncationMode::Exact,
        }
    }
}

impl TokenBudget {
    pub fn available(&self) -> usize {
        self.max_tokens.saturating_sub(self.prompt_reserve)
    }
}

/// 按平均密度换算的字符截断位置
///
/// `floor(chars * available / token_count)`，结果不超过 `chars`。
pub fn char_cutoff(char_count: usize, token_count: usize, available: usize) -> usize {
    if token_count == 0 {
        return char_count;
    }
    let cutoff = (char_count as u128 * available as u128) / token_count as u128;
    cutoff.min(char_count as u128) as usize
}

/// GPT-2 分词器（r50k_base）
pub struct Tokenizer {
    bpe: CoreBPE,
}

impl Tokenizer {
    pub fn gpt2() -> Result<Self, PaperError> {
        let bpe = tiktoken_rs::r50k_base().map_err(|e| PaperError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// 把文本截断到预算以内
    pub fn truncate(&self, text: &str, budget: &TokenBudget) -> Result<String, PaperError> {
        let tokens = self.bpe.encode_ordinary(text);
        let available = budget.available();

        match budget.mode {
            TruncationMode::Exact => {
                if tokens.len() <= available {
                    return Ok(text.to_string());
                }
                // 截断点可能落在多字节字符中间，回退到能完整解码的位置
                let mut end = available;
                loop {
                    match self.bpe.decode(tokens[..end].to_vec()) {
                        Ok(decoded) => return Ok(decoded),
                        Err(e) if end == 0 || available - end >= 4 => {
                            return Err(PaperError::Tokenizer(e.to_string()))
                        }
                        Err(_) => end -= 1,
                    }
                }
            }
            TruncationMode::CharRatio => {
                let char_count = text.chars().count();
                let cutoff = char_cutoff(char_count, tokens.len(), available);
                Ok(text.chars().take(cutoff).collect())
            }
        }
    }
}

/// 发送给 LLM 的一组提示词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPrompt {
    pub system: String,
    pub user: String,
}

/// 构建系统提示词
pub fn system_prompt(research_field: &str, review_format: &str, language: Language) -> String {
    format!(
        "You are a professional reviewer in the field of {}. Now I will give you a paper. \
         You need to give a complete review opinion according to the following requirements and format:{} \
         Please answer in {}.",
        research_field, review_format, language
    )
}

/// 按固定顺序拼接论文正文
///
/// 顺序：标题、第一章、Introduction、第 5 章、第 6 章、Conclusion。
/// - 第一章、Introduction 必需，缺失时报错
/// - 第 5、6 章可选，论文章节不足时跳过并记录警告
/// - Conclusion 可选，缺失时直接跳过
pub fn compose_paper_text(paper: &Paper) -> Result<String, PaperError> {
    let first = paper
        .section_at(0)
        .ok_or_else(|| PaperError::MissingSection("first section".to_string()))?;
    let introduction = paper
        .section("Introduction")
        .ok_or_else(|| PaperError::MissingSection("Introduction".to_string()))?;

    let mut text = String::new();
    text.push_str("Title:");
    text.push_str(&paper.title);
    text.push_str(&first.text);
    text.push_str("Introduction:");
    text.push_str(introduction);

    for index in [4, 5] {
        match paper.section_at(index) {
            Some(section) => text.push_str(&section.text),
            None => warn!(
                "论文 {} 只有 {} 个章节，跳过第 {} 章",
                paper.file_name(),
                paper.sections.len(),
                index + 1
            ),
        }
    }

    if let Some(conclusion) = paper.section("Conclusion") {
        text.push_str("Conclusion:");
        text.push_str(conclusion);
    }

    Ok(text)
}

/// 提示词构建器
pub struct PromptBuilder {
    tokenizer: Tokenizer,
    budget: TokenBudget,
}

impl PromptBuilder {
    pub fn new(budget: TokenBudget) -> Result<Self, PaperError> {
        Ok(Self {
            tokenizer: Tokenizer::gpt2()?,
            budget,
        })
    }

    /// 构建审稿提示词
    ///
    /// # 参数
    /// - `paper`: 论文
    /// - `research_field`: 研究领域
    /// - `language`: 输出语言
    /// - `review_format`: 审稿格式模板内容
    pub fn build(
        &self,
        paper: &Paper,
        research_field: &str,
        language: Language,
        review_format: &str,
    ) -> Result<ReviewPrompt, PaperError> {
        let text = compose_paper_text(paper)?;
        let truncated = self.tokenizer.truncate(&text, &self.budget)?;

        debug!(
            "论文正文 {} 字符，截断后 {} 字符（{:?}）",
            text.chars().count(),
            truncated.chars().count(),
            self.budget.mode
        );

        Ok(ReviewPrompt {
            system: system_prompt(research_field, review_format, language),
            user: format!("This is the paper for your review:{}", truncated),
        })
    }
}
