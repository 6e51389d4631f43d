//! 审稿服务 - 业务能力层
//!
//! 只负责"把提示词发给 LLM 并拿回审稿意见"，不关心论文从哪来、结果写到哪去。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务均可通过 `LLM_API_BASE_URL` 接入
//! - 每次尝试都从 `KeyRotator` 取下一个密钥，失败按 `RetryPolicy` 退避重试

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{BackendError, ReviewError};
use crate::services::key_rotator::KeyRotator;
use crate::services::prompt_builder::ReviewPrompt;
use crate::services::retry::{RetryOutcome, RetryPolicy};

/// token 用量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// 一次成功调用的原始返回
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    /// 每个 choice 的内容
    pub contents: Vec<String>,
    pub usage: Option<TokenUsage>,
}

/// 审稿结果
#[derive(Debug, Clone)]
pub struct ReviewReply {
    /// 所有 choice 拼接后的审稿意见
    pub text: String,
    pub usage: Option<TokenUsage>,
    /// 成功那次请求的耗时
    pub elapsed: Duration,
    /// 实际尝试次数
    pub attempts: u32,
}

/// 聊天补全接口
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// 用给定密钥发送一次 system + user 请求
    async fn complete(&self, api_key: &str, prompt: &ReviewPrompt)
        -> Result<ChatReply, BackendError>;
}

/// OpenAI 兼容接口
pub struct OpenAiBackend {
    api_base_url: String,
    model_name: String,
}

impl OpenAiBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            api_base_url: config.llm_api_base_url.clone(),
            model_name: config.llm_model_name.clone(),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(
        &self,
        api_key: &str,
        prompt: &ReviewPrompt,
    ) -> Result<ChatReply, BackendError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", prompt.user.len());

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&self.api_base_url);
        let client = Client::with_config(openai_config);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(prompt.system.as_str())
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.user.as_str())
            .build()?;
        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .n(1)
            .build()?;

        let response = client.chat().create(request).await?;

        if response.choices.is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        let contents = response
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .collect();
        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatReply { contents, usage })
    }
}

/// 审稿客户端
///
/// 持有密钥轮换器和重试策略，一次 `review` 对应一篇论文。
pub struct ReviewClient<B: ChatBackend> {
    backend: B,
    rotator: KeyRotator,
    policy: RetryPolicy,
}

impl<B: ChatBackend> ReviewClient<B> {
    pub fn new(backend: B, rotator: KeyRotator, policy: RetryPolicy) -> Self {
        Self {
            backend,
            rotator,
            policy,
        }
    }

    pub fn rotator(&self) -> &KeyRotator {
        &self.rotator
    }

    /// 发送审稿请求
    ///
    /// # 返回
    /// 成功时返回拼接后的审稿意见；重试耗尽时返回最后一次的错误
    pub async fn review(&mut self, prompt: &ReviewPrompt) -> Result<ReviewReply, ReviewError> {
        let backend = &self.backend;
        let rotator = &mut self.rotator;

        let outcome = self
            .policy
            .run(|attempt| {
                let key = rotator.next_key().to_string();
                debug!("第 {} 次请求，使用密钥 {}", attempt, mask_key(&key));
                async move {
                    let started = Instant::now();
                    backend
                        .complete(&key, prompt)
                        .await
                        .map(|reply| (reply, started.elapsed()))
                }
            })
            .await;

        match outcome {
            RetryOutcome::Success {
                value: (reply, elapsed),
                attempts,
            } => {
                let text = reply.contents.concat();
                log_reply(&text, reply.usage.as_ref(), elapsed);
                Ok(ReviewReply {
                    text,
                    usage: reply.usage,
                    elapsed,
                    attempts,
                })
            }
            RetryOutcome::Exhausted { error, attempts } => {
                Err(ReviewError::RetriesExhausted {
                    attempts,
                    source: error,
                })
            }
        }
    }
}

/// 日志中只显示密钥末尾 4 位
fn mask_key(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

fn log_reply(text: &str, usage: Option<&TokenUsage>, elapsed: Duration) {
    debug!("{}", "*".repeat(80));
    debug!("{}", text);
    debug!("{}", "*".repeat(80));
    match usage {
        Some(usage) => info!(
            "prompt_token_used: {} | completion_token_used: {} | total_token_used: {}",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        ),
        None => info!("接口未返回 token 用量"),
    }
    info!("response_time: {:.3} s", elapsed.as_secs_f64());
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;
    use crate::services::key_rotator::WrapRule;

    fn prompt() -> ReviewPrompt {
        ReviewPrompt {
            system: "system".to_string(),
            user: "user".to_string(),
        }
    }

    fn client(backend: ScriptedBackend, keys: &[&str]) -> ReviewClient<ScriptedBackend> {
        let rotator = KeyRotator::new(
            keys.iter().map(|k| k.to_string()).collect(),
            WrapRule::RoundRobin,
        )
        .unwrap();
        ReviewClient::new(backend, rotator, RetryPolicy::immediate(5))
    }

    #[tokio::test]
    async fn test_review_succeeds_after_four_failures() {
        let mut client = client(ScriptedBackend::failing_then(4, &["looks good"]), &["sk-aaaaaa"]);

        let reply = client.review(&prompt()).await.unwrap();

        assert_eq!(reply.text, "looks good");
        assert_eq!(reply.attempts, 5);
        assert_eq!(client.backend.calls(), 5);
    }

    #[tokio::test]
    async fn test_review_reraises_final_failure() {
        let mut client = client(ScriptedBackend::failing_then(6, &["never"]), &["sk-aaaaaa"]);

        let err = client.review(&prompt()).await.unwrap_err();

        let ReviewError::RetriesExhausted { attempts, source } = err;
        assert_eq!(attempts, 5);
        assert_eq!(source.to_string(), "LLM 请求失败: failure 5");
        assert_eq!(client.backend.calls(), 5);
    }

    #[tokio::test]
    async fn test_review_concatenates_choices() {
        let mut client = client(ScriptedBackend::failing_then(0, &["part one. ", "part two."]), &["sk-aaaaaa"]);

        let reply = client.review(&prompt()).await.unwrap();

        assert_eq!(reply.text, "part one. part two.");
        assert_eq!(reply.usage.map(|u| u.total_tokens), Some(15));
    }

    #[tokio::test]
    async fn test_each_attempt_takes_next_key() {
        let mut client = client(
            ScriptedBackend::failing_then(2, &["ok"]),
            &["sk-key-0", "sk-key-1"],
        );

        client.review(&prompt()).await.unwrap();

        let used = client.backend.keys_used.lock().unwrap().clone();
        assert_eq!(used, vec!["sk-key-0", "sk-key-1", "sk-key-0"]);
        assert_eq!(client.rotator().cursor(), 1);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdef1234"), "****1234");
        assert_eq!(mask_key("ab"), "****ab");
    }

    /// 测试真实 API 连通性
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=sk-... cargo test test_openai_backend_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_openai_backend_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let api_key = std::env::var("LLM_API_KEY").expect("需要设置 LLM_API_KEY");
        let backend = OpenAiBackend::new(&Config::from_env().unwrap());
        let reply = backend
            .complete(
                &api_key,
                &ReviewPrompt {
                    system: "You are a concise assistant.".to_string(),
                    user: "Say hello.".to_string(),
                },
            )
            .await;

        tokio_test::assert_ok!(&reply);
        assert!(!reply.unwrap().contents.is_empty());
    }
}
