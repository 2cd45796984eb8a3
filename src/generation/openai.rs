//! OpenAI Chat Completions バックエンド

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, FinishReason,
};
use async_openai::Client;
use color_eyre::Result;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument};

use super::{GenerationBackend, GenerationFailure, SYSTEM_PROMPT};
use crate::config::GenerationConfig;

/// トークン制限戦略を表現する列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenLimitStrategy {
    /// `max_tokens` を使用（4oモデル向け）
    MaxTokens,
    /// `max_completion_tokens` を使用（それ以降のモデル向け）
    MaxCompletionTokens,
}

/// モデル名からトークン制限戦略を判定する
fn determine_token_limit_strategy(model: &str) -> TokenLimitStrategy {
    if model.contains("4o") || model.starts_with("gpt-3.5") {
        TokenLimitStrategy::MaxTokens
    } else {
        TokenLimitStrategy::MaxCompletionTokens
    }
}

/// async-openai をブロッキングで呼ぶバックエンド。ランタイムは自前で1つ保持する。
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    runtime: Runtime,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiBackend {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::with_config(OpenAIConfig::new().with_api_key(config.api_key.clone()));
        let runtime = Runtime::new()?;
        info!(target: "generation", model = %config.model, timeout_secs = config.timeout_secs, "openai_backend_ready");
        Ok(Self {
            client,
            runtime,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
        })
    }

    // max_tokens は新しいモデルでは非推奨
    #[allow(deprecated)]
    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest, GenerationFailure> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(request_error)?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(request_error)?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![system.into(), user.into()];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(messages);
        let strategy = determine_token_limit_strategy(&self.model);
        debug!(target: "generation", ?strategy, "token_limit_strategy");
        match strategy {
            TokenLimitStrategy::MaxTokens => builder.max_tokens(self.max_tokens),
            TokenLimitStrategy::MaxCompletionTokens => builder.max_completion_tokens(self.max_tokens),
        };
        builder.build().map_err(request_error)
    }

    async fn generate_async(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let req = self.build_request(prompt)?;
        let resp = match tokio::time::timeout(self.timeout, self.client.chat().create(req)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(request_error(e)),
            Err(_) => return Err(GenerationFailure::Timeout { secs: self.timeout.as_secs() }),
        };
        debug!(target: "generation", choices = resp.choices.len(), "openai_response");

        let Some(choice) = resp.choices.into_iter().next() else {
            return Err(GenerationFailure::Empty);
        };
        interpret_choice(choice.message.content, choice.message.refusal, choice.finish_reason)
    }
}

impl GenerationBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(name = "openai_generate", skip(self, prompt), fields(model = %self.model))]
    fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        self.runtime.block_on(self.generate_async(prompt))
    }
}

fn request_error(e: impl std::fmt::Display) -> GenerationFailure {
    GenerationFailure::Request(e.to_string())
}

/// 1つの choice をテキスト or 失敗に変換する
fn interpret_choice(
    content: Option<String>,
    refusal: Option<String>,
    finish_reason: Option<FinishReason>,
) -> Result<String, GenerationFailure> {
    match content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => {
            if let Some(reason) = refusal.filter(|r| !r.trim().is_empty()) {
                return Err(GenerationFailure::Blocked { reason });
            }
            if finish_reason == Some(FinishReason::ContentFilter) {
                return Err(GenerationFailure::Blocked { reason: "content_filter".to_string() });
            }
            Err(GenerationFailure::Empty)
        }
    }
}
