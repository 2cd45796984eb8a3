//! コンソールでの対話ループ
//!
//! 入出力は `BufRead` / `Write` で受け取るので、テストでは `Cursor` と `Vec<u8>` を渡せる。

use color_eyre::Result;
use crossterm::style::Stylize;
use std::io::{BufRead, Write};
use tracing::info;

use crate::combat::{CombatEngine, CombatPhase, CombatState, Resolution, TurnReport};
use crate::config::ConsoleConfig;

/// 対話ループの終わり方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Won,
    Lost,
    /// `/quit` または入力終端で抜けた
    Abandoned,
}

pub fn title(out: &mut impl Write, engine: &CombatEngine) -> Result<()> {
    let s = engine.state();
    writeln!(out, "{}", "==============================".dark_grey())?;
    writeln!(out, "   {}", "LLM Combat (demo)".bold())?;
    writeln!(out, "{}", "==============================".dark_grey())?;
    writeln!(out, "A wild {} appears! Describe what {} does each turn.", s.enemy_name, s.player_name)?;
    writeln!(out, "Type /quit to leave.\n")?;
    Ok(())
}

pub fn show_status(out: &mut impl Write, state: &CombatState) -> Result<()> {
    writeln!(out, "--- Turn {} ---", state.turn)?;
    writeln!(out, "{:<8} HP: {}/{}", state.player_name, state.player_hp.to_string().green(), state.player_max_hp)?;
    writeln!(out, "{:<8} HP: {}/{}", state.enemy_name, state.enemy_hp.to_string().red(), state.enemy_max_hp)?;
    Ok(())
}

pub fn show_turn(out: &mut impl Write, report: &TurnReport) -> Result<()> {
    if let Resolution::GenerationFailed(failure) = &report.resolution {
        writeln!(out, "{}", format!("(the narrator is silent: {failure})").dark_grey())?;
    }
    writeln!(out, "{}", report.outcome.description.as_str().yellow())?;
    writeln!(
        out,
        "You deal {} damage and take {} damage.",
        report.outcome.damage_to_enemy, report.outcome.damage_to_player
    )?;
    if let Some(dmg) = report.enemy_damage {
        writeln!(out, "The {} strikes back for {} damage!", report.state.enemy_name, dmg)?;
    }
    Ok(())
}

pub fn show_result(out: &mut impl Write, state: &CombatState, end: SessionEnd) -> Result<()> {
    match end {
        SessionEnd::Won => writeln!(out, "{}", format!("You defeated the {}! Victory!", state.enemy_name).green().bold())?,
        SessionEnd::Lost => writeln!(out, "{}", format!("{} has fallen... Defeat.", state.player_name).red().bold())?,
        SessionEnd::Abandoned => writeln!(out, "You walk away from the fight.")?,
    }
    writeln!(out, "\nThanks for playing! Bye.")?;
    Ok(())
}

/// 決着か中断まで1行ずつ入力を読みターンを進める
pub fn run<R: BufRead, W: Write>(
    engine: &mut CombatEngine,
    input: &mut R,
    out: &mut W,
    config: &ConsoleConfig,
) -> Result<SessionEnd> {
    title(out, engine)?;

    let end = loop {
        show_status(out, engine.state())?;
        write!(out, "What do you do? > ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break SessionEnd::Abandoned;
        }
        let action = line.trim();
        if matches!(action, "/quit" | "/exit") {
            break SessionEnd::Abandoned;
        }
        info!(target: "console", action, "player_action");

        // 終了済みなら呼ばないので AlreadyFinished にはならない
        let report = engine.play_turn(action)?;
        pause(config);
        show_turn(out, &report)?;
        pause(config);

        match report.phase_after {
            CombatPhase::PlayerWon => break SessionEnd::Won,
            CombatPhase::PlayerLost => break SessionEnd::Lost,
            _ => writeln!(out)?,
        }
    };

    show_result(out, engine.state(), end)?;
    info!(target: "console", ?end, turn = engine.state().turn, "session_end");
    Ok(end)
}

fn pause(config: &ConsoleConfig) {
    if config.pause_ms > 0 {
        std::thread::sleep(config.pause());
    }
}
