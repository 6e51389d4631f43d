//! 命令行参数

use crate::config::Config;
use crate::services::Language;
use clap::Parser;
use std::path::PathBuf;

/// 读取 PDF 论文并调用 LLM 生成审稿意见
#[derive(Parser, Debug, Clone)]
#[command(name = "chat_reviewer")]
#[command(about = "Generate review opinions for PDF papers with a chat completion API")]
pub struct Cli {
    /// 论文路径：单个 PDF 或包含 PDF 的目录
    #[arg(long = "paper_path", alias = "paper-path")]
    pub paper_path: PathBuf,

    /// 输出文件格式
    #[arg(long = "file_format", alias = "file-format", default_value = "txt")]
    pub file_format: String,

    /// 论文所属研究领域
    #[arg(
        long = "research_fields",
        alias = "research-fields",
        default_value = "computer science and artificial intelligence"
    )]
    pub research_fields: String,

    /// 输出语言：en 或 zh（其余取值按 zh 处理）
    #[arg(long, default_value = "en")]
    pub language: String,
}

impl Cli {
    /// 把命令行参数合并到配置上
    pub fn apply(self, config: Config) -> Config {
        Config {
            paper_path: self.paper_path,
            file_format: self.file_format,
            research_fields: self.research_fields,
            language: Language::from_arg(&self.language),
            ..config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["chat_reviewer", "--paper_path", "papers"]).unwrap();
        let config = cli.apply(Config::default());

        assert_eq!(config.paper_path, PathBuf::from("papers"));
        assert_eq!(config.file_format, "txt");
        assert_eq!(config.research_fields, "computer science and artificial intelligence");
        assert_eq!(config.language, Language::English);
    }

    #[test]
    fn test_overrides_and_kebab_aliases() {
        let cli = Cli::try_parse_from([
            "chat_reviewer",
            "--paper-path",
            "a.pdf",
            "--file_format",
            "md",
            "--research-fields",
            "physics",
            "--language",
            "de",
        ])
        .unwrap();
        let config = cli.apply(Config::default());

        assert_eq!(config.file_format, "md");
        assert_eq!(config.research_fields, "physics");
        assert_eq!(config.language, Language::Chinese);
    }

    #[test]
    fn test_paper_path_is_required() {
        assert!(Cli::try_parse_from(["chat_reviewer"]).is_err());
    }
}
