//! 程序配置
//!
//! 默认值 → 环境变量 → 命令行参数，依次覆盖。
//! API 密钥单独存放在 TOML 文件中，启动时读取并校验。

use crate::error::ConfigError;
use crate::services::key_rotator::WrapRule;
use crate::services::prompt_builder::{Language, TokenBudget, TruncationMode};
use crate::services::retry::RetryPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 论文路径（单个 PDF 或目录）
    pub paper_path: PathBuf,
    /// 输出文件扩展名
    pub file_format: String,
    /// 论文所属研究领域
    pub research_fields: String,
    /// 审稿意见的输出语言
    pub language: Language,
    /// API 密钥文件
    pub api_key_file: PathBuf,
    /// 审稿格式模板文件
    pub review_format_file: PathBuf,
    /// 审稿结果输出目录
    pub output_dir: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次请求的 token 上限
    pub max_token_num: usize,
    /// 为系统提示词预留的 token 数
    pub review_prompt_token: usize,
    pub retry_max_attempts: u32,
    pub truncation_mode: TruncationMode,
    pub key_wrap: WrapRule,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paper_path: PathBuf::new(),
            file_format: "txt".to_string(),
            research_fields: "computer science and artificial intelligence".to_string(),
            language: Language::English,
            api_key_file: PathBuf::from("apikey.toml"),
            review_format_file: PathBuf::from("ReviewFormat.txt"),
            output_dir: PathBuf::from("output_file"),
            verbose_logging: false,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-3.5-turbo".to_string(),
            max_token_num: 4096,
            review_prompt_token: 1000,
            retry_max_attempts: 5,
            truncation_mode: TruncationMode::Exact,
            key_wrap: WrapRule::RoundRobin,
        }
    }
}

impl Config {
    /// 从环境变量读取配置
    ///
    /// 已设置但无法解析的变量直接报错，不回退到默认值。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置，`lookup` 返回 `None` 表示未设置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            paper_path: default.paper_path,
            file_format: default.file_format,
            research_fields: default.research_fields,
            language: default.language,
            api_key_file: lookup("APIKEY_FILE").map(PathBuf::from).unwrap_or(default.api_key_file),
            review_format_file: lookup("REVIEW_FORMAT_FILE").map(PathBuf::from).unwrap_or(default.review_format_file),
            output_dir: lookup("OUTPUT_DIR").map(PathBuf::from).unwrap_or(default.output_dir),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING")?.unwrap_or(default.verbose_logging),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            max_token_num: parse_var(&lookup, "MAX_TOKEN_NUM")?.unwrap_or(default.max_token_num),
            review_prompt_token: parse_var(&lookup, "REVIEW_PROMPT_TOKEN")?.unwrap_or(default.review_prompt_token),
            retry_max_attempts: parse_var(&lookup, "RETRY_MAX_ATTEMPTS")?.unwrap_or(default.retry_max_attempts),
            truncation_mode: parse_var(&lookup, "TRUNCATION_MODE")?.unwrap_or(default.truncation_mode),
            key_wrap: parse_var(&lookup, "KEY_WRAP")?.unwrap_or(default.key_wrap),
        })
    }

    pub fn token_budget(&self) -> TokenBudget {
        TokenBudget {
            max_tokens: self.max_token_num,
            prompt_reserve: self.review_prompt_token,
            mode: self.truncation_mode,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            ..RetryPolicy::default()
        }
    }

    /// 启动前校验：密钥可用、模板文件存在
    ///
    /// # 返回
    /// 返回过滤后的 API 密钥列表
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        if self.max_token_num <= self.review_prompt_token {
            return Err(ConfigError::InvalidValue {
                key: "REVIEW_PROMPT_TOKEN",
                value: format!("{} >= MAX_TOKEN_NUM {}", self.review_prompt_token, self.max_token_num),
            });
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RETRY_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }
        if !self.review_format_file.is_file() {
            return Err(ConfigError::MissingResource(self.review_format_file.clone()));
        }

        let keys = load_api_keys(&self.api_key_file)?;
        if keys.is_empty() {
            return Err(ConfigError::NoApiKeys);
        }
        Ok(keys)
    }
}

/// 解析单个配置项：未设置返回 `None`，设置了但解析失败返回错误
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

/// API 密钥文件结构
///
/// ```toml
/// [OpenAI]
/// OPENAI_API_KEYS = ["sk-...", "sk-..."]
/// ```
#[derive(Debug, Deserialize)]
struct ApiKeyFile {
    #[serde(rename = "OpenAI")]
    openai: OpenAiSection,
}

#[derive(Debug, Deserialize)]
struct OpenAiSection {
    #[serde(rename = "OPENAI_API_KEYS")]
    api_keys: KeyList,
}

/// 密钥既可以写成 TOML 数组，也可以写成 `"[sk-a, sk-b]"` 字符串
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeyList {
    List(Vec<String>),
    Joined(String),
}

/// 从 TOML 文件读取 API 密钥
pub fn load_api_keys(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    parse_api_key_file(&content).map_err(|source| ConfigError::ParseFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_api_key_file(content: &str) -> Result<Vec<String>, toml::de::Error> {
    let file: ApiKeyFile = toml::from_str(content)?;
    let keys = match file.openai.api_keys {
        KeyList::List(items) => items.iter().filter_map(|k| clean_key(k)).collect(),
        KeyList::Joined(raw) => parse_key_list(&raw),
    };
    Ok(keys)
}

/// 解析逗号分隔的密钥字符串
///
/// 去掉首尾方括号和引号，丢弃长度不超过 5 的条目（空串、占位符）。
pub fn parse_key_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw);
    raw.split(',').filter_map(clean_key).collect()
}

fn clean_key(key: &str) -> Option<String> {
    let key: String = key.chars().filter(|c| *c != '\'' && *c != '"').collect();
    // 长度在去空白之前判断
    (key.chars().count() > 5).then(|| key.trim().to_string())
}
