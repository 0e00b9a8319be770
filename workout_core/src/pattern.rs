//! Training pattern expansion.
//!
//! Turns an ordered list of base exercises into the timed main-section
//! sequence for one of the four patterns:
//! - Standard: each exercise once
//! - Circuit: the whole list repeated per round, each round opened by a marker
//! - Tabata: each exercise repeated at a fixed 20s/10s, opened by a set marker
//! - Pyramid: each exercise climbed up then down through intensity levels

use crate::{Exercise, ItemKind, SectionType, SequenceItem, TrainingPattern};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const CIRCUIT_ROUNDS: RangeInclusive<u32> = 2..=6;
pub const TABATA_ROUNDS: RangeInclusive<u32> = 4..=12;
pub const PYRAMID_LEVELS: RangeInclusive<u32> = 3..=7;
pub const PATTERN_REST: RangeInclusive<u32> = 0..=300;
pub const CIRCUIT_EXERCISES: RangeInclusive<u32> = 2..=12;

pub const TABATA_WORK_SECONDS: u32 = 20;
pub const TABATA_REST_SECONDS: u32 = 10;

const DEFAULT_CIRCUIT_REST: u32 = 60;
const DEFAULT_TABATA_SET_REST: u32 = 30;
const DEFAULT_PYRAMID_LEVEL_REST: u32 = 45;
const DEFAULT_CIRCUIT_EXERCISES: u32 = 6;

/// Pattern choice plus the user's explicit overrides.
///
/// An override, once set, wins over the duration-derived value and survives
/// later duration changes. Without one, the value is re-derived from the
/// duration every time the settings are resolved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PatternSettings {
    pub pattern: TrainingPattern,
    /// Circuit rounds or tabata rounds per exercise
    #[serde(default)]
    pub rounds: Option<u32>,
    /// Pyramid levels
    #[serde(default)]
    pub levels: Option<u32>,
    /// Rest between circuit rounds, tabata sets or pyramid levels
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    /// Distinct exercises in each circuit round
    #[serde(default)]
    pub exercises_per_round: Option<u32>,
}

impl PatternSettings {
    pub fn new(pattern: TrainingPattern) -> Self {
        Self {
            pattern,
            ..Self::default()
        }
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = Some(levels);
        self
    }

    pub fn with_rest(mut self, rest_seconds: u32) -> Self {
        self.rest_seconds = Some(rest_seconds);
        self
    }

    pub fn with_exercises_per_round(mut self, count: u32) -> Self {
        self.exercises_per_round = Some(count);
        self
    }

    /// Switch to `pattern`, keeping the overrides only if it is unchanged
    pub fn switch_to(self, pattern: TrainingPattern) -> Self {
        if self.pattern == pattern {
            self
        } else {
            Self::new(pattern)
        }
    }

    /// How many base exercises one circuit round cycles through
    pub fn circuit_exercises(&self) -> u32 {
        self.exercises_per_round
            .map(|n| clamp_setting("circuit exercises", n, CIRCUIT_EXERCISES))
            .unwrap_or(DEFAULT_CIRCUIT_EXERCISES)
    }

    /// Resolve to concrete pattern parameters for a main-session duration
    pub fn resolve(&self, duration_minutes: u32) -> Pattern {
        match self.pattern {
            TrainingPattern::Standard => Pattern::Standard,
            TrainingPattern::Circuit => Pattern::Circuit {
                rounds: self
                    .rounds
                    .map(|r| clamp_setting("circuit rounds", r, CIRCUIT_ROUNDS))
                    .unwrap_or_else(|| circuit_rounds_for(duration_minutes)),
                rest_between: self.rest_or(DEFAULT_CIRCUIT_REST),
            },
            TrainingPattern::Tabata => Pattern::Tabata {
                rounds_per_exercise: self
                    .rounds
                    .map(|r| clamp_setting("tabata rounds", r, TABATA_ROUNDS))
                    .unwrap_or_else(|| tabata_rounds_for(duration_minutes)),
                rest_after_set: self.rest_or(DEFAULT_TABATA_SET_REST),
            },
            TrainingPattern::Pyramid => Pattern::Pyramid {
                levels: self
                    .levels
                    .map(|l| clamp_setting("pyramid levels", l, PYRAMID_LEVELS))
                    .unwrap_or_else(|| pyramid_levels_for(duration_minutes)),
                rest_between_levels: self.rest_or(DEFAULT_PYRAMID_LEVEL_REST),
            },
        }
    }

    fn rest_or(&self, default: u32) -> u32 {
        self.rest_seconds
            .map(|r| clamp_setting("pattern rest", r, PATTERN_REST))
            .unwrap_or(default)
    }
}

fn clamp_setting(name: &str, value: u32, range: RangeInclusive<u32>) -> u32 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        tracing::warn!(
            "{} {} outside {}..={}, clamped to {}",
            name,
            value,
            range.start(),
            range.end(),
            clamped
        );
    }
    clamped
}

/// clamp(⌊D/10⌋, 2, 6)
pub fn circuit_rounds_for(duration_minutes: u32) -> u32 {
    (duration_minutes / 10).clamp(*CIRCUIT_ROUNDS.start(), *CIRCUIT_ROUNDS.end())
}

/// clamp(⌊D/5⌋, 4, 12)
pub fn tabata_rounds_for(duration_minutes: u32) -> u32 {
    (duration_minutes / 5).clamp(*TABATA_ROUNDS.start(), *TABATA_ROUNDS.end())
}

/// clamp(⌊D/8⌋, 3, 7)
pub fn pyramid_levels_for(duration_minutes: u32) -> u32 {
    (duration_minutes / 8).clamp(*PYRAMID_LEVELS.start(), *PYRAMID_LEVELS.end())
}

/// Concrete pattern parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    Standard,
    Circuit { rounds: u32, rest_between: u32 },
    Tabata { rounds_per_exercise: u32, rest_after_set: u32 },
    Pyramid { levels: u32, rest_between_levels: u32 },
}

impl Pattern {
    pub fn kind(&self) -> TrainingPattern {
        match self {
            Pattern::Standard => TrainingPattern::Standard,
            Pattern::Circuit { .. } => TrainingPattern::Circuit,
            Pattern::Tabata { .. } => TrainingPattern::Tabata,
            Pattern::Pyramid { .. } => TrainingPattern::Pyramid,
        }
    }
}

/// Expand base exercises into main-section sequence items.
///
/// Markers carry the rest that separates one round or set from the
/// previous one; the first marker of a pattern carries none.
pub fn generate(base: &[Exercise], pattern: &Pattern) -> Vec<SequenceItem> {
    let kind = pattern.kind();
    let tagged = |exercise: &Exercise| {
        let mut item = SequenceItem::exercise(exercise.clone(), SectionType::Main);
        item.pattern = kind;
        item
    };

    let mut items = Vec::new();
    if base.is_empty() {
        return items;
    }

    match *pattern {
        Pattern::Standard => {
            for exercise in base {
                let mut item = tagged(exercise);
                item.round = Some(1);
                items.push(item);
            }
        }

        Pattern::Circuit {
            rounds,
            rest_between,
        } => {
            for round in 1..=rounds {
                let rest = if round == 1 { 0 } else { rest_between };
                let mut marker = SequenceItem::marker(
                    ItemKind::RoundMarker {
                        round,
                        total_rounds: rounds,
                    },
                    kind,
                    rest,
                );
                marker.round = Some(round);
                items.push(marker);

                for exercise in base {
                    let mut item = tagged(exercise);
                    item.round = Some(round);
                    items.push(item);
                }
            }
        }

        Pattern::Tabata {
            rounds_per_exercise,
            rest_after_set,
        } => {
            for (idx, exercise) in base.iter().enumerate() {
                let rest = if idx == 0 { 0 } else { rest_after_set };
                items.push(SequenceItem::marker(
                    ItemKind::SetMarker {
                        exercise_name: exercise.name.clone(),
                    },
                    kind,
                    rest,
                ));

                for round in 1..=rounds_per_exercise {
                    let mut item = tagged(exercise);
                    item.round = Some(round);
                    item.work_override = Some(TABATA_WORK_SECONDS);
                    item.rest_override = Some(TABATA_REST_SECONDS);
                    item.last_round = round == rounds_per_exercise;
                    items.push(item);
                }
            }
        }

        Pattern::Pyramid {
            levels,
            rest_between_levels,
        } => {
            for (idx, exercise) in base.iter().enumerate() {
                let rest = if idx == 0 { 0 } else { rest_between_levels };
                items.push(SequenceItem::marker(
                    ItemKind::SetMarker {
                        exercise_name: exercise.name.clone(),
                    },
                    kind,
                    rest,
                ));

                for level in 1..=levels {
                    let mut item = tagged(exercise);
                    item.level = Some(level);
                    item.ascending = Some(true);
                    item.rest_override = Some(rest_between_levels);
                    items.push(item);
                }

                for level in (1..levels).rev() {
                    let mut item = tagged(exercise);
                    item.level = Some(level);
                    item.ascending = Some(false);
                    item.rest_override = Some(if level == 1 { 0 } else { rest_between_levels });
                    items.push(item);
                }
            }
        }
    }

    tracing::debug!(
        "Expanded {} base exercises into {} {:?} items",
        base.len(),
        items.len(),
        kind
    );
    items
}
