//! テキスト生成バックエンドとの境界
//!
//! `GenerationClient` は起動時に1度だけ作られ、エンジンへ値として渡される。
//! 失敗は `GenerationFailure` として返し、呼び出し側はデータとして扱う。

pub mod gemini;
pub mod openai;
pub mod prompt;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::combat::CombatState;
use crate::config::{GenerationConfig, Provider};

pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;
pub use prompt::{build_prompt, SYSTEM_PROMPT};

/// 生成リクエストの失敗理由。戦闘ループを止めることはない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    #[error("request failed: {0}")]
    Request(String),
    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("no response within {secs}s")]
    Timeout { secs: u64 },
    #[error("provider returned an empty response")]
    Empty,
    #[error("response was blocked: {reason}")]
    Blocked { reason: String },
}

/// プロンプトを受け取りテキストを返すプロバイダ
pub trait GenerationBackend {
    /// ログ用の名前
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str) -> Result<String, GenerationFailure>;
}

/// 戦闘状態からプロンプトを組み立て、バックエンドへ投げるクライアント
pub struct GenerationClient {
    backend: Box<dyn GenerationBackend>,
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl GenerationClient {
    pub fn new(backend: Box<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// 設定されたプロバイダのバックエンドを作る
    pub fn from_config(config: &GenerationConfig) -> color_eyre::Result<Self> {
        let backend: Box<dyn GenerationBackend> = match config.provider {
            Provider::OpenAi => Box::new(OpenAiBackend::new(config)?),
            Provider::Gemini => Box::new(GeminiBackend::new(config)?),
        };
        Ok(Self::new(backend))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// 現在の状態とプレイヤーの行動文から結果テキストを要求する
    #[instrument(name = "request_outcome", skip(self, state), fields(backend = self.backend.name(), turn = state.turn))]
    pub fn request_outcome(&self, state: &CombatState, action: &str) -> Result<String, GenerationFailure> {
        let prompt = build_prompt(state, action);
        info!(target: "generation", prompt_len = prompt.len(), "generation_request");
        let result = self
            .backend
            .generate(&prompt)
            .and_then(|text| if text.trim().is_empty() { Err(GenerationFailure::Empty) } else { Ok(text) });
        match &result {
            Ok(text) => info!(target: "generation", len = text.len(), "generation_response"),
            Err(e) => warn!(target: "generation", error = %e, "generation_failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatRules;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// 送られたプロンプトを記録するバックエンド
    struct Recording {
        reply: Result<String, GenerationFailure>,
        seen: Rc<RefCell<Vec<String>>>,
    }

    fn recording(reply: Result<String, GenerationFailure>) -> (Recording, Rc<RefCell<Vec<String>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        (Recording { reply, seen: seen.clone() }, seen)
    }

    impl GenerationBackend for Recording {
        fn name(&self) -> &str { "recording" }
        fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
            self.seen.borrow_mut().push(prompt.to_string());
            self.reply.clone()
        }
    }

    #[test]
    fn blank_text_is_reported_as_empty() {
        let (backend, _) = recording(Ok("  \n ".into()));
        let state = CombatState::from_rules(&CombatRules::default());
        let client = GenerationClient::new(Box::new(backend));
        assert_eq!(client.request_outcome(&state, "kick"), Err(GenerationFailure::Empty));
    }

    #[test]
    fn client_sends_the_built_prompt() {
        let (backend, seen) = recording(Ok("ok".into()));
        let state = CombatState::from_rules(&CombatRules::default());
        let client = GenerationClient::new(Box::new(backend));
        assert_eq!(client.request_outcome(&state, "kick").as_deref(), Ok("ok"));
        assert_eq!(*seen.borrow(), vec![build_prompt(&state, "kick")]);
    }

    #[test]
    fn failures_pass_through_as_values() {
        let failure = GenerationFailure::Blocked { reason: "SAFETY".into() };
        let (backend, seen) = recording(Err(failure.clone()));
        let client = GenerationClient::new(Box::new(backend));
        let state = CombatState::from_rules(&CombatRules::default());
        assert_eq!(client.request_outcome(&state, "kick"), Err(failure));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(format!("{client:?}"), "GenerationClient { backend: \"recording\" }");
    }
}
