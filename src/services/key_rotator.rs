//! API 密钥轮换
//!
//! 每次调用取出当前密钥并前移游标，到达末尾后回到开头。

use crate::error::ConfigError;
use std::str::FromStr;

/// 游标回绕规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapRule {
    /// 游标到达 `count` 时回到 0，每个密钥轮流使用
    #[default]
    RoundRobin,
    /// 游标到达 `count - 1` 时回到 0，最后一个密钥不会被取出（`count == 1` 除外）
    SkipLast,
}

impl FromStr for WrapRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "round_robin" | "round-robin" => Ok(Self::RoundRobin),
            "skip_last" | "skip-last" => Ok(Self::SkipLast),
            other => Err(ConfigError::InvalidValue {
                key: "KEY_WRAP",
                value: other.to_string(),
            }),
        }
    }
}

/// API 密钥轮换器
#[derive(Debug, Clone)]
pub struct KeyRotator {
    keys: Vec<String>,
    cursor: usize,
    wrap: WrapRule,
}

impl KeyRotator {
    /// 创建轮换器，密钥列表为空时直接失败
    pub fn new(keys: Vec<String>, wrap: WrapRule) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::NoApiKeys);
        }
        Ok(Self {
            keys,
            cursor: 0,
            wrap,
        })
    }

    /// 取出当前密钥并前移游标
    pub fn next_key(&mut self) -> &str {
        let index = self.cursor;
        self.cursor += 1;

        let limit = match self.wrap {
            WrapRule::RoundRobin => self.keys.len(),
            WrapRule::SkipLast => self.keys.len() - 1,
        };
        if self.cursor >= limit {
            self.cursor = 0;
        }

        &self.keys[index]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
