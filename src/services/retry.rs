//! 指数退避重试策略

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// 重试策略
///
/// 第 k 次（从 1 开始）失败后的等待时间为
/// `clamp(multiplier * 2^(k-1), min_delay, max_delay)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// 重试结果：成功，或耗尽次数后的最后一次错误
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Success { value: T, attempts: u32 },
    Exhausted { error: E, attempts: u32 },
}

impl RetryPolicy {
    /// 不等待的策略，用于测试
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// 第 `attempt` 次失败后的等待时间
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.multiplier.saturating_mul(factor);
        delay.clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }

    /// 执行 `op`，失败时按策略等待后重试
    ///
    /// `op` 接收当前尝试序号（从 1 开始）。
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> RetryOutcome<T, E>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome::Success {
                        value,
                        attempts: attempt,
                    }
                }
                Err(error) if attempt >= max_attempts => {
                    return RetryOutcome::Exhausted {
                        error,
                        attempts: attempt,
                    }
                }
                Err(error) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        "第 {}/{} 次调用失败: {}，{:.1} 秒后重试",
                        attempt,
                        max_attempts,
                        error,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
