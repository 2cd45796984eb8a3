use crate::combat::CombatState;

/// チャット系プロバイダ向けのシステムメッセージ
pub const SYSTEM_PROMPT: &str =
    "You are the narrator of a short fantasy duel. Follow the requested output format exactly.";

/// 状態と行動文から決定的にプロンプトを組み立てる（同じ入力なら同じ文字列）
pub fn build_prompt(state: &CombatState, action: &str) -> String {
    format!(
        "You are narrating turn {turn} of a fight between {player} and a {enemy}.\n\
         {player} has {php}/{pmax} HP. The {enemy} has {ehp}/{emax} HP.\n\
         {player} attempts the following action: \"{action}\"\n\
         \n\
         Describe what happens in ONE vivid sentence. Then, on separate lines, write exactly:\n\
         DAMAGE_TO_ENEMY: <non-negative integer>\n\
         DAMAGE_TO_PLAYER: <non-negative integer>\n\
         Use 0 when nobody is hurt. A clumsy or reckless action may hurt {player}. \
         Keep damage proportionate; a single action rarely deals more than 15.",
        turn = state.turn,
        player = state.player_name,
        enemy = state.enemy_name,
        php = state.player_hp,
        pmax = state.player_max_hp,
        ehp = state.enemy_hp,
        emax = state.enemy_max_hp,
    )
}
