use serde::{Deserialize, Serialize};

/// 戦闘のパラメータ一式（HP上限・名前・敵の固定攻撃力）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRules {
    pub player_name: String,
    pub player_max_hp: u32,
    pub player_start_hp: u32,
    pub enemy_name: String,
    pub enemy_max_hp: u32,
    pub enemy_start_hp: u32,
    /// 敵フェーズで毎ターン与える固定ダメージ
    pub enemy_attack_damage: u32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            player_name: "Hero".to_string(),
            player_max_hp: 50,
            player_start_hp: 50,
            enemy_name: "Goblin".to_string(),
            enemy_max_hp: 30,
            enemy_start_hp: 30,
            enemy_attack_damage: 8,
        }
    }
}

impl CombatRules {
    /// `COMBAT_PLAYER` があればプレイヤー名を差し替える
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rules = Self::default();
        if let Some(name) = get("COMBAT_PLAYER").map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            rules.player_name = name;
        }
        rules
    }

    /// 開始HPを上限で丸めた値 (player, enemy)
    pub fn starting_hp(&self) -> (u32, u32) {
        (
            self.player_start_hp.min(self.player_max_hp),
            self.enemy_start_hp.min(self.enemy_max_hp),
        )
    }
}
