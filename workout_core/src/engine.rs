//! Workout generation engine.
//!
//! Turns a validated request into a ready-to-run session:
//! - Filter the catalog by level and equipment
//! - Pick warm-up, main and cool-down records at random
//! - Expand the main records with the chosen training pattern
//! - Annotate every exercise with its best automatic alternative

use crate::pattern::{generate, Pattern, PatternSettings};
use crate::sequence::SequenceBuilder;
use crate::substitution::{annotate_suggestions, Preferences};
use crate::types::*;
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

pub const DURATION_MINUTES: RangeInclusive<u32> = 15..=60;
pub const WORK_SECONDS: RangeInclusive<u32> = 20..=120;
pub const REST_SECONDS: RangeInclusive<u32> = 10..=60;

/// Everything the person chose before generating a workout
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutRequest {
    pub level: FitnessLevel,
    pub duration_minutes: u32,
    pub work_seconds: u32,
    pub rest_seconds: u32,
    /// Equipment labels; empty means bodyweight only
    pub equipment: Vec<String>,
    pub pattern: PatternSettings,
    pub cues: CueSettings,
}

impl Default for WorkoutRequest {
    fn default() -> Self {
        Self {
            level: FitnessLevel::Intermediate,
            duration_minutes: 30,
            work_seconds: 45,
            rest_seconds: 15,
            equipment: vec![BODYWEIGHT.to_string()],
            pattern: PatternSettings::default(),
            cues: CueSettings::default(),
        }
    }
}

impl WorkoutRequest {
    /// Reject out-of-range inputs before anything is generated
    pub fn validate(&self) -> Result<()> {
        if !DURATION_MINUTES.contains(&self.duration_minutes) {
            return Err(Error::Validation(format!(
                "Duration must be between {} and {} minutes, got {}",
                DURATION_MINUTES.start(),
                DURATION_MINUTES.end(),
                self.duration_minutes
            )));
        }
        validate_timing(&self.timing())
    }

    pub fn timing(&self) -> Timing {
        Timing {
            work_seconds: self.work_seconds,
            rest_seconds: self.rest_seconds,
        }
    }

    /// Requested equipment, defaulting to bodyweight when none was chosen
    pub fn equipment(&self) -> Vec<String> {
        let equipment: Vec<String> = self
            .equipment
            .iter()
            .filter(|e| !e.trim().is_empty())
            .cloned()
            .collect();
        if equipment.is_empty() {
            vec![BODYWEIGHT.to_string()]
        } else {
            equipment
        }
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.level, &self.equipment())
    }

    fn allows(&self, exercise: &Exercise, equipment: &[String]) -> bool {
        let label = normalize_tag(&exercise.equipment);
        exercise.allows_level(self.level)
            && (label == normalize_tag(BODYWEIGHT)
                || equipment.iter().any(|e| normalize_tag(e) == label))
    }
}

/// Session-wide work/rest must sit inside the accepted ranges
pub fn validate_timing(timing: &Timing) -> Result<()> {
    if !WORK_SECONDS.contains(&timing.work_seconds) {
        return Err(Error::Validation(format!(
            "Work time must be between {} and {} seconds, got {}",
            WORK_SECONDS.start(),
            WORK_SECONDS.end(),
            timing.work_seconds
        )));
    }
    if !REST_SECONDS.contains(&timing.rest_seconds) {
        return Err(Error::Validation(format!(
            "Rest time must be between {} and {} seconds, got {}",
            REST_SECONDS.start(),
            REST_SECONDS.end(),
            timing.rest_seconds
        )));
    }
    Ok(())
}

/// How many records of each section to pick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SectionCounts {
    warmup: usize,
    main: usize,
    cooldown: usize,
}

fn section_counts(pattern: &Pattern, request: &WorkoutRequest) -> SectionCounts {
    let d = request.duration_minutes as usize;
    match pattern {
        Pattern::Standard => SectionCounts {
            warmup: 4,
            main: (d / 3).max(6),
            cooldown: 3,
        },
        Pattern::Circuit { .. } => SectionCounts {
            warmup: 3,
            main: request.pattern.circuit_exercises() as usize,
            cooldown: 2,
        },
        Pattern::Tabata { .. } => SectionCounts {
            warmup: 3,
            main: (d / 10).clamp(2, 6),
            cooldown: 2,
        },
        Pattern::Pyramid { .. } => SectionCounts {
            warmup: 3,
            main: (d / 15).clamp(2, 4),
            cooldown: 2,
        },
    }
}

fn pick<R: Rng + ?Sized>(pool: &[&Exercise], count: usize, rng: &mut R) -> Vec<Exercise> {
    let mut shuffled: Vec<&Exercise> = pool.to_vec();
    shuffled.shuffle(rng);
    shuffled.into_iter().take(count).cloned().collect()
}

/// Generate a fresh session from a request
///
/// Validation is atomic: on error nothing is produced.
pub fn generate_session<R: Rng + ?Sized>(
    catalog: &Catalog,
    request: &WorkoutRequest,
    rng: &mut R,
) -> Result<SessionState> {
    request.validate()?;

    let equipment = request.equipment();
    let pattern = request.pattern.resolve(request.duration_minutes);
    let counts = section_counts(&pattern, request);

    let pool = |section: SectionType| -> Vec<&Exercise> {
        catalog
            .exercises
            .iter()
            .filter(|ex| ex.section == section && request.allows(ex, &equipment))
            .collect()
    };

    let main_pool = pool(SectionType::Main);
    if main_pool.is_empty() {
        return Err(Error::Validation(format!(
            "No main exercises available for {} with {}",
            request.level,
            equipment.join(", ")
        )));
    }

    let warmup = pick(&pool(SectionType::Warmup), counts.warmup, rng);
    let base = pick(&main_pool, counts.main, rng);
    let cooldown = pick(&pool(SectionType::Cooldown), counts.cooldown, rng);

    let main = generate(&base, &pattern);
    let mut sequence = SequenceBuilder::build(&warmup, main, &cooldown);
    annotate_suggestions(catalog, &mut sequence, &request.preferences());

    tracing::info!(
        "Generated {} session: {} items ({} warm-up, {} main base, {} cool-down)",
        pattern.kind(),
        sequence.len(),
        warmup.len(),
        base.len(),
        cooldown.len()
    );

    let mut state = SessionState::new(
        sequence,
        request.timing(),
        request.pattern.clone(),
        request.duration_minutes,
    );
    state.cues = request.cues;
    Ok(state)
}
