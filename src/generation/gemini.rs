//! Google Gemini (generateContent REST API) バックエンド
//!
//! `reqwest::blocking` で同期的に呼び出す。`COMBAT_SAFETY_THRESHOLD` が設定されていれば
//! 4つのハームカテゴリ全てにその閾値を safetySettings として付ける。
//!
//! 応答の扱い:
//! * `promptFeedback.blockReason` がある → `Blocked`
//! * 候補にテキストが無く finishReason がブロック系 → `Blocked`
//! * 候補が無い / テキストが空 → `Empty`

use color_eyre::{eyre::WrapErr, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{GenerationBackend, GenerationFailure};
use crate::config::GenerationConfig;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const BLOCKING_FINISH_REASONS: [&str; 5] = ["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting<'a>>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SafetySetting<'a> {
    category: &'static str,
    threshold: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SafetyRating {
    category: String,
    probability: String,
    #[serde(default)]
    blocked: bool,
}

pub struct GeminiBackend {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    safety_threshold: Option<String>,
    timeout: Duration,
}

impl GeminiBackend {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent("llm_combat/0.1")
            .timeout(config.timeout())
            .build()
            .wrap_err("building reqwest client for gemini")?;
        info!(target: "generation", model = %config.model, safety = ?config.safety_threshold, "gemini_backend_ready");
        Ok(Self {
            http,
            endpoint: API_BASE.to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            safety_threshold: config.safety_threshold.clone(),
            timeout: config.timeout(),
        })
    }

    /// 送信・本文読み取りどちらの失敗も同じ分類にする
    fn transport_error(&self, e: reqwest::Error) -> GenerationFailure {
        if e.is_timeout() {
            GenerationFailure::Timeout { secs: self.timeout.as_secs() }
        } else {
            GenerationFailure::Request(e.to_string())
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateContentRequest<'a> {
        let safety_settings = match &self.safety_threshold {
            Some(threshold) => HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting { category: *category, threshold: threshold.as_str() })
                .collect(),
            None => Vec::new(),
        };
        GenerateContentRequest {
            contents: vec![RequestContent { role: "user", parts: vec![RequestPart { text: prompt }] }],
            safety_settings,
            generation_config: GenerationParams { max_output_tokens: self.max_tokens },
        }
    }
}

impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(name = "gemini_generate", skip(self, prompt), fields(model = %self.model))]
    fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let text = resp.text().map_err(|e| self.transport_error(e))?;
        debug!(target: "generation", status = %status, len = text.len(), "gemini_response_raw");
        if !status.is_success() {
            return Err(GenerationFailure::Status { code: status.as_u16(), body: text });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationFailure::Request(format!("invalid response JSON: {e}")))?;
        interpret_response(parsed)
    }
}

/// 応答JSONをテキスト or 失敗に変換する
fn interpret_response(resp: GenerateContentResponse) -> Result<String, GenerationFailure> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationFailure::Blocked { reason });
    }
    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(GenerationFailure::Empty);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if !text.trim().is_empty() {
        return Ok(text);
    }

    match candidate.finish_reason {
        Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) => {
            for rating in candidate.safety_ratings.iter().filter(|r| r.blocked || r.probability != "NEGLIGIBLE") {
                warn!(target: "generation", category = %rating.category, probability = %rating.probability, blocked = rating.blocked, "gemini_safety_rating");
            }
            Err(GenerationFailure::Blocked { reason })
        }
        _ => Err(GenerationFailure::Empty),
    }
}
