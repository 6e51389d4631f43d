use async_trait::async_trait;
use paper_reviewer::error::{BackendError, PaperError};
use paper_reviewer::models::{PaperSource, PdfPaperSource};
use paper_reviewer::services::{ChatBackend, ChatReply, Language, ReviewPrompt, TokenUsage};
use paper_reviewer::{App, Config, Paper, Section};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// 按文件名返回预设论文，文件名以 `broken` 开头的论文缺少 Introduction
struct FakePaperSource;

#[async_trait]
impl PaperSource for FakePaperSource {
    async fn load(&self, path: &Path) -> Result<Paper, PaperError> {
        let stem = path.file_stem().unwrap().to_string_lossy().to_string();
        let mut sections = vec![Section::new("Abstract", "We measure gravity.")];
        if !stem.starts_with("broken") {
            sections.push(Section::new("Introduction", "Gravity pulls things down."));
        }
        for name in ["A", "B", "C", "D"] {
            sections.push(Section::new(name, format!("section {}", name)));
        }
        sections.push(Section::new("Conclusion", "Gravity is real."));
        Ok(Paper::new(format!("On Gravity: {}?", stem), sections, path))
    }
}

/// 记录收到的提示词，总是返回成功
#[derive(Clone, Default)]
struct RecordingBackend {
    prompts: Arc<Mutex<Vec<ReviewPrompt>>>,
    keys: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    async fn complete(&self, api_key: &str, prompt: &ReviewPrompt) -> Result<ChatReply, BackendError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.keys.lock().unwrap().push(api_key.to_string());
        Ok(ChatReply {
            contents: vec!["* Overall Review: solid work.".to_string()],
            usage: Some(TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            }),
        })
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(keys: &str, papers: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("apikey.toml"),
            format!("[OpenAI]\nOPENAI_API_KEYS = \"{}\"\n", keys),
        )
        .unwrap();
        fs::write(
            dir.path().join("ReviewFormat.txt"),
            "* Overall Review\n* Strengths\n* Weaknesses",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("papers")).unwrap();
        for paper in papers {
            fs::write(dir.path().join("papers").join(paper), b"%PDF-1.4").unwrap();
        }
        Self { dir }
    }

    fn config(&self, paper_path: PathBuf) -> Config {
        Config {
            paper_path,
            research_fields: "physics".to_string(),
            language: Language::English,
            api_key_file: self.dir.path().join("apikey.toml"),
            review_format_file: self.dir.path().join("ReviewFormat.txt"),
            output_dir: self.dir.path().join("output_file"),
            ..Config::default()
        }
    }

    fn papers_dir(&self) -> PathBuf {
        self.dir.path().join("papers")
    }
}

#[tokio::test]
async fn test_single_paper_end_to_end() {
    let ws = Workspace::new("[sk-aaaaaa, sk-bbbbbb]", &["gravity.pdf"]);
    let backend = RecordingBackend::default();
    let config = ws.config(ws.papers_dir().join("gravity.pdf"));

    let mut app = App::with_parts(config, FakePaperSource, backend.clone()).unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.total, 1);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.failed, 0);

    let output = &stats.outputs[0];
    let name = output.file_name().unwrap().to_string_lossy().to_string();
    let pattern = Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{2}-On Gravity_ gravity_\.txt$").unwrap();
    assert!(pattern.is_match(&name), "unexpected file name: {}", name);

    let content = fs::read_to_string(output).unwrap();
    assert_eq!(content, "## Paper: 1\n\n\n\n\n* Overall Review: solid work.");

    let prompts = backend.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].system.contains("in the field of physics"));
    assert!(prompts[0].system.contains("* Strengths"));
    assert!(prompts[0].system.ends_with("Please answer in English."));
    assert!(prompts[0].user.contains("Title:On Gravity: gravity?"));
    assert!(prompts[0].user.contains("Introduction:Gravity pulls things down."));
    assert!(prompts[0].user.ends_with("Conclusion:Gravity is real."));
}

#[tokio::test]
async fn test_failed_paper_does_not_stop_batch() {
    let ws = Workspace::new("[sk-aaaaaa, sk-bbbbbb]", &["a.pdf", "broken.pdf", "c.pdf"]);
    let backend = RecordingBackend::default();
    let config = ws.config(ws.papers_dir());

    let mut app = App::with_parts(config, FakePaperSource, backend.clone()).unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.success, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.outputs.len(), 2);

    // 失败的论文不会发出请求，密钥按成功的请求轮换
    let keys = backend.keys.lock().unwrap().clone();
    assert_eq!(keys, vec!["sk-aaaaaa", "sk-bbbbbb"]);

    let third = fs::read_to_string(&stats.outputs[1]).unwrap();
    assert!(third.starts_with("## Paper: 3"));
}

#[tokio::test]
async fn test_review_format_is_read_for_every_paper() {
    let ws = Workspace::new("[sk-aaaaaa]", &["a.pdf"]);
    let backend = RecordingBackend::default();
    let config = ws.config(ws.papers_dir());

    let mut app = App::with_parts(config, FakePaperSource, backend.clone()).unwrap();
    app.run().await.unwrap();

    fs::write(ws.dir.path().join("ReviewFormat.txt"), "* Updated Format").unwrap();
    app.run().await.unwrap();

    let prompts = backend.prompts.lock().unwrap();
    assert!(prompts[0].system.contains("* Strengths"));
    assert!(prompts[1].system.contains("* Updated Format"));
}

#[tokio::test]
async fn test_second_run_overwrites_previous_output() {
    let ws = Workspace::new("[sk-aaaaaa]", &["a.pdf"]);
    let config = ws.config(ws.papers_dir());

    let mut app = App::with_parts(config, FakePaperSource, RecordingBackend::default()).unwrap();
    app.run().await.unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.success, 1);
    let content = fs::read_to_string(&stats.outputs[0]).unwrap();
    assert_eq!(content, "## Paper: 1\n\n\n\n\n* Overall Review: solid work.");
}

#[test]
fn test_empty_key_list_fails_before_work() {
    let ws = Workspace::new("[]", &["a.pdf"]);
    let config = ws.config(ws.papers_dir());

    let result = App::with_parts(config, FakePaperSource, RecordingBackend::default());

    assert!(result.is_err());
    assert!(!ws.dir.path().join("output_file").exists());
}

#[tokio::test]
async fn test_missing_paper_path_is_an_error() {
    let ws = Workspace::new("[sk-aaaaaa]", &[]);
    let config = ws.config(ws.dir.path().join("nowhere"));

    let mut app = App::with_parts(config, FakePaperSource, RecordingBackend::default()).unwrap();

    assert!(app.run().await.is_err());
}

/// 用真实 PDF 测试章节提取
///
/// 运行方式：
/// ```bash
/// PAPER_PDF=/path/to/paper.pdf cargo test test_extract_real_pdf -- --ignored --nocapture
/// ```
#[tokio::test]
#[ignore]
async fn test_extract_real_pdf() {
    paper_reviewer::logger::init(true);

    let path = PathBuf::from(std::env::var("PAPER_PDF").expect("需要设置 PAPER_PDF"));
    let paper = PdfPaperSource.load(&path).await.expect("PDF 提取失败");

    println!("标题: {}", paper.title);
    for section in &paper.sections {
        println!("  {} ({} 字符)", section.name, section.text.chars().count());
    }
    assert!(!paper.sections.is_empty());
}
