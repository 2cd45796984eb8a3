
// 同階層のファイルをモジュールとしてインポート
pub mod combat; // HP状態機械と応答パーサ
pub mod config;
pub mod console; // 対話ループ（標準入出力）
pub mod generation; // テキスト生成バックエンドとの境界

pub use combat::{ActionOutcome, CombatEngine, CombatPhase, CombatRules, CombatState, TurnReport};
pub use config::{ConfigError, ConsoleConfig, GenerationConfig, Provider};
pub use generation::{GenerationBackend, GenerationClient, GenerationFailure};

// Ensure .env is loaded for tests before anything else runs in the test process.
#[cfg(test)]
#[ctor::ctor]
fn load_dotenv_for_tests() {
    let _ = dotenvy::dotenv();
}
