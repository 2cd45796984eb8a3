use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{ActionOutcome, CombatPhase, CombatState, Resolution, TurnReport};
use super::parser;
use super::rules::CombatRules;
use crate::generation::GenerationClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("combat is already over ({0})")]
    AlreadyFinished(CombatPhase),
}

/// プレイヤーと敵のHP、ターン進行、勝敗判定を持つ状態機械
#[derive(Debug)]
pub struct CombatEngine {
    rules: CombatRules,
    state: CombatState,
    phase: CombatPhase,
    client: GenerationClient,
}

impl CombatEngine {
    pub fn new(rules: CombatRules, client: GenerationClient) -> Self {
        let state = CombatState::from_rules(&rules);
        info!(target: "combat", player = %state.player_name, enemy = %state.enemy_name,
              player_hp = state.player_hp, enemy_hp = state.enemy_hp, backend = client.backend_name(), "combat_started");
        Self { rules, state, phase: CombatPhase::AwaitingPlayerAction, client }
    }

    pub fn state(&self) -> &CombatState { &self.state }
    pub fn phase(&self) -> CombatPhase { self.phase }
    pub fn rules(&self) -> &CombatRules { &self.rules }
    pub fn is_over(&self) -> bool { self.phase.is_terminal() }

    /// 1ターン（プレイヤーフェーズ + 必要なら敵フェーズ）を最後まで進める
    pub fn play_turn(&mut self, action: &str) -> Result<TurnReport, CombatError> {
        if self.phase.is_terminal() {
            return Err(CombatError::AlreadyFinished(self.phase));
        }

        let turn = self.state.turn;
        let mut phases = Vec::new();
        let mut outcome = ActionOutcome::hesitation();
        let mut resolution = Resolution::Hesitated;
        let mut enemy_damage = None;

        loop {
            phases.push(self.phase);
            let next = match self.phase {
                CombatPhase::AwaitingPlayerAction => {
                    if action.trim().is_empty() {
                        // 生成をスキップしてそのまま判定へ
                        self.state.apply_outcome(&outcome);
                        CombatPhase::CheckPlayerOutcome
                    } else {
                        CombatPhase::ResolvingPlayerAction
                    }
                }
                CombatPhase::ResolvingPlayerAction => {
                    (outcome, resolution) = self.resolve_action(action);
                    self.state.apply_outcome(&outcome);
                    CombatPhase::CheckPlayerOutcome
                }
                CombatPhase::CheckPlayerOutcome => self.check_player_outcome(),
                CombatPhase::EnemyAttack => {
                    let dmg = self.rules.enemy_attack_damage;
                    self.state.damage_player(dmg);
                    enemy_damage = Some(dmg);
                    CombatPhase::CheckEnemyOutcome
                }
                CombatPhase::CheckEnemyOutcome => {
                    if self.state.player_down() {
                        CombatPhase::PlayerLost
                    } else {
                        self.state.turn += 1;
                        CombatPhase::AwaitingPlayerAction
                    }
                }
                CombatPhase::PlayerWon | CombatPhase::PlayerLost => break,
            };
            debug!(target: "combat", from = %self.phase, to = %next, player_hp = self.state.player_hp, enemy_hp = self.state.enemy_hp, "phase_transition");
            self.phase = next;
            if next == CombatPhase::AwaitingPlayerAction {
                break;
            }
        }

        match serde_json::to_string(&self.state) {
            Ok(json) => debug!(target: "combat", snapshot = %json, "turn_finished"),
            Err(e) => warn!(target: "combat", error = %e, "snapshot_serialize_failed"),
        }
        if self.phase.is_terminal() {
            info!(target: "combat", result = %self.phase, turn, "combat_finished");
        }

        Ok(TurnReport {
            turn,
            action: action.to_string(),
            outcome,
            resolution,
            enemy_damage,
            phases,
            state: self.state.clone(),
            phase_after: self.phase,
        })
    }

    /// 生成を要求し、成功なら解析、失敗なら固定のフォールバックにする
    fn resolve_action(&self, action: &str) -> (ActionOutcome, Resolution) {
        match self.client.request_outcome(&self.state, action) {
            Ok(raw) => (parser::parse(&raw), Resolution::Generated),
            Err(failure) => {
                warn!(target: "combat", error = %failure, "using fallback outcome");
                (ActionOutcome::generation_fallback(), Resolution::GenerationFailed(failure))
            }
        }
    }

    /// 同じ行動で双方が倒れた場合は自滅扱い（敗北）を優先する
    fn check_player_outcome(&self) -> CombatPhase {
        if self.state.player_down() {
            CombatPhase::PlayerLost
        } else if self.state.enemy_down() {
            CombatPhase::PlayerWon
        } else {
            CombatPhase::EnemyAttack
        }
    }
}
