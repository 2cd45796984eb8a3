#![allow(dead_code)]

use llm_combat::{CombatEngine, CombatRules, GenerationBackend, GenerationClient, GenerationFailure};
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Once;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static START: Once = Once::new();
static _GUARD: Lazy<std::sync::Mutex<Option<tracing_appender::non_blocking::WorkerGuard>>> =
    Lazy::new(|| std::sync::Mutex::new(None));

/// Initialize test environment: dotenv and tracing (stderr + file).
/// Idempotent: safe to call multiple times.
pub fn init() {
    START.call_once(|| {
        let _ = dotenvy::dotenv();
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .expect("env filter");

        // Daily rotating log file separate from app runtime logs
        let file_appender = rolling::daily("logs", "tests.log");
        let (file_nb, guard) = tracing_appender::non_blocking(file_appender);
        *_GUARD.lock().unwrap() = Some(guard); // retain guard for lifetime

        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_test_writer();

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(file_nb);

        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();

        tracing::info!(target: "test_init", "Test tracing initialized (stderr + rotating file)");
    });
}

/// Replays canned replies in order and records every prompt it receives.
/// When the queue runs dry it answers `Empty`.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    replies: Rc<RefCell<VecDeque<Result<String, GenerationFailure>>>>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, GenerationFailure>>,
    {
        Self {
            replies: Rc::new(RefCell::new(replies.into_iter().collect())),
            prompts: Rc::default(),
        }
    }

    pub fn texts<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.as_ref().to_string())))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.replies.borrow_mut().pop_front().unwrap_or(Err(GenerationFailure::Empty))
    }
}

/// Formats a reply the way the tagged-line protocol asks for.
pub fn reply(description: &str, to_enemy: u32, to_player: u32) -> String {
    format!("{description}\nDAMAGE_TO_ENEMY: {to_enemy}\nDAMAGE_TO_PLAYER: {to_player}\n")
}

/// Engine with default rules (player 50, enemy 30, enemy attack 8); returns the backend handle
/// so tests can inspect what was sent.
pub fn engine_with(backend: ScriptedBackend) -> (CombatEngine, ScriptedBackend) {
    engine_with_rules(CombatRules::default(), backend)
}

pub fn engine_with_rules(rules: CombatRules, backend: ScriptedBackend) -> (CombatEngine, ScriptedBackend) {
    let handle = backend.clone();
    let engine = CombatEngine::new(rules, GenerationClient::new(Box::new(backend)));
    (engine, handle)
}
