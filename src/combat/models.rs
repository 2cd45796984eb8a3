use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::CombatRules;
use crate::generation::GenerationFailure;

/// 生成結果が解析不能なときの説明文
pub const MURKY_DESCRIPTION: &str = "The action happens, but the details are murky.";
/// 空入力のときの説明文
pub const HESITATION_DESCRIPTION: &str = "You hesitate, and the moment slips away.";
/// 生成に失敗したときの説明文
pub const FALLBACK_DESCRIPTION: &str =
    "The world seems to hold its breath. Your action fizzles and nothing comes of it.";

/// 二者の現在のHPとターン数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    pub player_name: String,
    pub player_hp: u32,
    pub player_max_hp: u32,
    pub enemy_name: String,
    pub enemy_hp: u32,
    pub enemy_max_hp: u32,
    pub turn: u32,
}

impl CombatState {
    pub fn from_rules(rules: &CombatRules) -> Self {
        let (player_hp, enemy_hp) = rules.starting_hp();
        Self {
            player_name: rules.player_name.clone(),
            player_hp,
            player_max_hp: rules.player_max_hp,
            enemy_name: rules.enemy_name.clone(),
            enemy_hp,
            enemy_max_hp: rules.enemy_max_hp,
            turn: 1,
        }
    }

    /// 敵へのダメージ → プレイヤーへのダメージの順に適用する。HPは0で止まる。
    pub fn apply_outcome(&mut self, outcome: &ActionOutcome) {
        self.enemy_hp = self.enemy_hp.saturating_sub(outcome.damage_to_enemy);
        self.player_hp = self.player_hp.saturating_sub(outcome.damage_to_player);
    }

    pub fn damage_player(&mut self, amount: u32) {
        self.player_hp = self.player_hp.saturating_sub(amount);
    }

    pub fn player_down(&self) -> bool { self.player_hp == 0 }
    pub fn enemy_down(&self) -> bool { self.enemy_hp == 0 }
}

/// 1回のプレイヤー行動の結果（説明文 + 2つのダメージ値）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub description: String,
    pub damage_to_enemy: u32,
    pub damage_to_player: u32,
}

impl ActionOutcome {
    pub fn new(description: impl Into<String>, damage_to_enemy: u32, damage_to_player: u32) -> Self {
        Self { description: description.into(), damage_to_enemy, damage_to_player }
    }

    pub fn hesitation() -> Self {
        Self::new(HESITATION_DESCRIPTION, 0, 0)
    }

    pub fn generation_fallback() -> Self {
        Self::new(FALLBACK_DESCRIPTION, 0, 0)
    }
}

/// 戦闘ステートマシンのフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    AwaitingPlayerAction,
    ResolvingPlayerAction,
    CheckPlayerOutcome,
    EnemyAttack,
    CheckEnemyOutcome,
    PlayerWon,
    PlayerLost,
}

impl CombatPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, CombatPhase::PlayerWon | CombatPhase::PlayerLost)
    }
}

impl fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CombatPhase::AwaitingPlayerAction => "AWAITING_PLAYER_ACTION",
            CombatPhase::ResolvingPlayerAction => "RESOLVING_PLAYER_ACTION",
            CombatPhase::CheckPlayerOutcome => "CHECK_PLAYER_OUTCOME",
            CombatPhase::EnemyAttack => "ENEMY_ATTACK",
            CombatPhase::CheckEnemyOutcome => "CHECK_ENEMY_OUTCOME",
            CombatPhase::PlayerWon => "PLAYER_WON",
            CombatPhase::PlayerLost => "PLAYER_LOST",
        };
        f.write_str(s)
    }
}

/// プレイヤー行動の結果をどう得たか
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// モデルの応答を解析した
    Generated,
    /// 空入力のため生成をスキップした
    Hesitated,
    /// 生成に失敗し固定のフォールバックを使った
    GenerationFailed(GenerationFailure),
}

/// 1ターン分の記録
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub turn: u32,
    pub action: String,
    pub outcome: ActionOutcome,
    pub resolution: Resolution,
    /// 敵フェーズが実行された場合のみ Some
    pub enemy_damage: Option<u32>,
    /// 通過したフェーズ（順序どおり）
    pub phases: Vec<CombatPhase>,
    pub state: CombatState,
    pub phase_after: CombatPhase,
}

impl TurnReport {
    pub fn is_over(&self) -> bool { self.phase_after.is_terminal() }

    pub fn visited(&self, phase: CombatPhase) -> bool { self.phases.contains(&phase) }
}
