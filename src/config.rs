//! 起動時の設定（環境変数 / .env から読み込む）

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// 生成プロバイダ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    /// 資格情報を読む環境変数名
    pub fn credential_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GOOGLE_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Gemini => "gemini-1.5-flash-latest",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => f.write_str("openai"),
            Provider::Gemini => f.write_str("gemini"),
        }
    }
}

/// 設定エラー。戦闘開始前に報告して終了する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} is not set (add it to the environment or a .env file)")]
    MissingCredential { var: &'static str },
    #[error("unknown provider {0:?} (expected \"openai\" or \"gemini\")")]
    UnknownProvider(String),
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// 生成クライアントの設定
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Gemini の safetySettings に使う閾値 (例: "BLOCK_ONLY_HIGH")
    pub safety_threshold: Option<String>,
}

// APIキーをログに出さない
impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("safety_threshold", &self.safety_threshold)
            .finish()
    }
}

impl GenerationConfig {
    pub const DEFAULT_MAX_TOKENS: u32 = 256;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// プロセス環境変数から読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から読み込む（テストでは HashMap を渡す）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match get("COMBAT_PROVIDER").map(|p| p.to_ascii_lowercase()) {
            None => Provider::OpenAi,
            Some(p) if p == "openai" => Provider::OpenAi,
            Some(p) if p == "gemini" || p == "google" => Provider::Gemini,
            Some(other) => return Err(ConfigError::UnknownProvider(other)),
        };

        let var = provider.credential_var();
        let api_key = get(var).ok_or(ConfigError::MissingCredential { var })?;

        let max_tokens = match get("COMBAT_MAX_TOKENS") {
            Some(v) => v
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber { var: "COMBAT_MAX_TOKENS", value: v })?,
            None => Self::DEFAULT_MAX_TOKENS,
        };
        let timeout_secs = parse_u64(get("COMBAT_TIMEOUT_SECS"), "COMBAT_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            provider,
            api_key,
            model: get("COMBAT_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            max_tokens,
            timeout_secs,
            safety_threshold: get("COMBAT_SAFETY_THRESHOLD"),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// コンソール表示の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// フェーズ間の演出用ウェイト（ミリ秒）
    pub pause_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { pause_ms: 600 }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = get("COMBAT_PAUSE_MS").filter(|v| !v.trim().is_empty());
        Ok(Self { pause_ms: parse_u64(value, "COMBAT_PAUSE_MS", Self::default().pause_ms)? })
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

fn parse_u64(value: Option<String>, var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(v) => v.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber { var, value: v }),
        None => Ok(default),
    }
}
