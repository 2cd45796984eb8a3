pub mod engine;
pub mod models;
pub mod parser;
pub mod rules;

pub use engine::{CombatEngine, CombatError};
pub use models::{ActionOutcome, CombatPhase, CombatState, Resolution, TurnReport};
pub use parser::{parse, read_tag, DamageTag, TagReading};
pub use rules::CombatRules;
