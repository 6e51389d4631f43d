//! 错误类型
//!
//! 按来源分为四类：配置、论文、审稿请求、输出文件。
//! 能力层返回这些具体类型，编排层和 `main` 统一转为 `anyhow::Error`。

use std::path::PathBuf;
use thiserror::Error;

/// 配置错误，启动阶段即失败
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 没有可用的 API 密钥
    #[error("没有可用的 API 密钥")]
    NoApiKeys,
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("无法解析配置文件 {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 资源文件不存在
    #[error("资源文件不存在: {0}")]
    MissingResource(PathBuf),
    /// 配置项取值非法
    #[error("配置项 {key} 取值非法: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// 论文相关错误
#[derive(Debug, Error)]
pub enum PaperError {
    /// 路径不存在
    #[error("路径不存在: {0}")]
    NotFound(PathBuf),
    /// 路径存在，但既不是 PDF 文件也不是目录
    #[error("不是 PDF 文件或目录: {0}")]
    NotPaperSource(PathBuf),
    /// 读取目录或文件失败
    #[error("无法读取 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// PDF 文本提取失败
    #[error("PDF 文本提取失败 {path}: {message}")]
    Extraction { path: PathBuf, message: String },
    /// 缺少必需的章节
    #[error("论文缺少必需章节: {0}")]
    MissingSection(String),
    /// 分词器初始化或编解码失败
    #[error("分词器错误: {0}")]
    Tokenizer(String),
}

/// 单次 API 调用的错误
#[derive(Debug, Error)]
pub enum BackendError {
    /// OpenAI 兼容接口返回错误
    #[error("LLM API 调用失败: {0}")]
    Api(#[from] async_openai::error::OpenAIError),
    /// 返回结果中没有任何内容
    #[error("LLM 返回内容为空")]
    EmptyResponse,
    /// 其他请求错误
    #[error("LLM 请求失败: {0}")]
    Request(String),
}

/// 审稿请求错误
#[derive(Debug, Error)]
pub enum ReviewError {
    /// 重试次数耗尽，携带最后一次失败
    #[error("重试 {attempts} 次后仍然失败: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: BackendError,
    },
}

/// 输出文件错误
#[derive(Debug, Error)]
pub enum OutputError {
    /// 创建输出目录失败
    #[error("无法创建输出目录 {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入输出文件失败
    #[error("无法写入输出文件 {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
