//! モデル応答の解析
//!
//! 自由文の末尾に `DAMAGE_TO_ENEMY: <n>` / `DAMAGE_TO_PLAYER: <n>` の2行が付く想定。
//! 形式が崩れていても必ず使える `ActionOutcome` を返す。

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use super::models::{ActionOutcome, MURKY_DESCRIPTION};

lazy_static! {
    // タグ名とコロンの間・コロンの後の装飾 (**, 空白) は許容。値は同じ行の最初のトークン。
    static ref ENEMY_TAG_RE: Regex =
        Regex::new(r"(?i)DAMAGE_TO_ENEMY[*_ \t]*:[*_ \t]*([^\s*]*)").expect("valid regex");
    static ref PLAYER_TAG_RE: Regex =
        Regex::new(r"(?i)DAMAGE_TO_PLAYER[*_ \t]*:[*_ \t]*([^\s*]*)").expect("valid regex");
}

const TRAILING_MARKS: &[char] = &['.', ',', ';', '!', ')'];

/// ダメージタグの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageTag {
    ToEnemy,
    ToPlayer,
}

impl DamageTag {
    pub fn label(self) -> &'static str {
        match self {
            DamageTag::ToEnemy => "DAMAGE_TO_ENEMY",
            DamageTag::ToPlayer => "DAMAGE_TO_PLAYER",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            DamageTag::ToEnemy => &*ENEMY_TAG_RE,
            DamageTag::ToPlayer => &*PLAYER_TAG_RE,
        }
    }
}

/// 1つのタグの読み取り結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagReading {
    Value(u32),
    /// タグはあるが値が無い
    Missing,
    /// タグはあるが整数として読めない
    Malformed(String),
    /// タグ自体が無い
    Absent,
}

impl TagReading {
    pub fn damage(&self) -> u32 {
        match self {
            TagReading::Value(n) => *n,
            _ => 0,
        }
    }
}

/// 最初に現れたタグの値を読む
pub fn read_tag(raw: &str, tag: DamageTag) -> TagReading {
    let Some(caps) = tag.pattern().captures(raw) else {
        return TagReading::Absent;
    };
    let token = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    if token.is_empty() {
        return TagReading::Missing;
    }
    // 数字の後ろに許すのは文末記号1つだけ (`7.` は可、`1,000` や `12abc` は不可)
    let digits = token.strip_suffix(TRAILING_MARKS).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return TagReading::Malformed(token.to_string());
    }
    match digits.parse::<u32>() {
        Ok(n) => TagReading::Value(n),
        Err(_) => TagReading::Malformed(token.to_string()),
    }
}

/// 生テキストから説明文とダメージ値を取り出す。失敗しない。
pub fn parse(raw: &str) -> ActionOutcome {
    let to_enemy = read_tag(raw, DamageTag::ToEnemy);
    let to_player = read_tag(raw, DamageTag::ToPlayer);
    warn_if_unusable(DamageTag::ToEnemy, &to_enemy);
    warn_if_unusable(DamageTag::ToPlayer, &to_player);

    let mut description = extract_description(raw);
    let no_tags = to_enemy == TagReading::Absent && to_player == TagReading::Absent;
    if description.is_empty() && no_tags {
        description = raw.trim().to_string();
    }
    if description.is_empty() {
        description = MURKY_DESCRIPTION.to_string();
    }

    let outcome = ActionOutcome {
        description,
        damage_to_enemy: to_enemy.damage(),
        damage_to_player: to_player.damage(),
    };
    debug!(target: "parser", to_enemy = outcome.damage_to_enemy, to_player = outcome.damage_to_player, "parsed_outcome");
    outcome
}

/// 最初のタグ行より前の行を説明文とする。タグが無ければ全文。
fn extract_description(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let first_tag_line = lines.iter().position(|line| {
        let upper = line.to_ascii_uppercase();
        upper.contains(DamageTag::ToEnemy.label()) || upper.contains(DamageTag::ToPlayer.label())
    });

    match first_tag_line {
        Some(idx) => lines[..idx]
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        None => raw.trim().to_string(),
    }
}

fn warn_if_unusable(tag: DamageTag, reading: &TagReading) {
    match reading {
        TagReading::Value(_) => {}
        TagReading::Missing => warn!(target: "parser", tag = tag.label(), "damage tag has no value; using 0"),
        TagReading::Malformed(token) => {
            warn!(target: "parser", tag = tag.label(), token = %token, "damage tag value is not a non-negative integer; using 0")
        }
        TagReading::Absent => warn!(target: "parser", tag = tag.label(), "damage tag not found; using 0"),
    }
}
