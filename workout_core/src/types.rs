//! Core domain types for the workout session engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and their extended attributes
//! - Training patterns, phases and timing
//! - Sequence items produced by the pattern generator
//! - The session state driven by the timer

use crate::pattern::PatternSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Equipment label meaning "no equipment required"
pub const BODYWEIGHT: &str = "Bodyweight";

/// Normalize a free-form label into a comparable tag ("Resistance Band" -> "resistance_band")
pub fn normalize_tag(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// ============================================================================
// Exercise Types
// ============================================================================

/// Fitness level of the person training
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    /// Numeric difficulty ceiling for this level (Beginner=1 .. Advanced=3)
    pub fn ceiling(self) -> u8 {
        match self {
            FitnessLevel::Beginner => 1,
            FitnessLevel::Intermediate => 2,
            FitnessLevel::Advanced => 3,
        }
    }

    /// Parse a level name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(FitnessLevel::Beginner),
            "intermediate" => Some(FitnessLevel::Intermediate),
            "advanced" => Some(FitnessLevel::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitnessLevel::Beginner => write!(f, "Beginner"),
            FitnessLevel::Intermediate => write!(f, "Intermediate"),
            FitnessLevel::Advanced => write!(f, "Advanced"),
        }
    }
}

/// Section of a workout an exercise belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Warmup,
    Main,
    Cooldown,
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionType::Warmup => write!(f, "Warm-up"),
            SectionType::Main => write!(f, "Main"),
            SectionType::Cooldown => write!(f, "Cool-down"),
        }
    }
}

/// Substitution attributes carried by every exercise.
///
/// Catalog records may omit any of these; the catalog loader fills in
/// defaults so scoring never has to check for presence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtendedAttributes {
    /// 1 (easy) to 3 (hard)
    pub difficulty: u8,
    pub muscle_groups: BTreeSet<String>,
    /// Empty (or only "none") means no equipment is needed
    pub equipment_needed: BTreeSet<String>,
    /// Injury limitations this exercise must be kept away from
    pub injury_exclusions: BTreeSet<String>,
    pub alternatives: Vec<String>,
}

impl ExtendedAttributes {
    /// Defaults for a record that carries no extended attributes
    pub fn derived(levels: &[FitnessLevel], muscle: &str, equipment: &str) -> Self {
        let difficulty = levels.iter().min().map(|l| l.ceiling()).unwrap_or(1);

        let mut muscle_groups = BTreeSet::new();
        muscle_groups.insert(normalize_tag(muscle));

        let mut equipment_needed = BTreeSet::new();
        if !equipment.eq_ignore_ascii_case(BODYWEIGHT) {
            equipment_needed.insert(normalize_tag(equipment));
        }

        Self {
            difficulty,
            muscle_groups,
            equipment_needed,
            injury_exclusions: BTreeSet::new(),
            alternatives: Vec::new(),
        }
    }
}

/// A catalog exercise record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub description: String,
    /// Equipment category label, e.g. "Bodyweight" or "Dumbbells"
    pub equipment: String,
    pub levels: Vec<FitnessLevel>,
    /// Primary muscle label, e.g. "Legs"
    pub muscle: String,
    pub section: SectionType,
    pub attributes: ExtendedAttributes,
}

impl Exercise {
    /// Create an exercise with derived extended attributes
    pub fn new(
        name: impl Into<String>,
        equipment: impl Into<String>,
        levels: &[FitnessLevel],
        muscle: impl Into<String>,
        section: SectionType,
    ) -> Self {
        let equipment = equipment.into();
        let muscle = muscle.into();
        let attributes = ExtendedAttributes::derived(levels, &muscle, &equipment);
        Self {
            name: name.into(),
            description: String::new(),
            equipment,
            levels: levels.to_vec(),
            muscle,
            section,
            attributes,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.attributes.difficulty = difficulty;
        self
    }

    pub fn with_muscle_groups(mut self, groups: &[&str]) -> Self {
        self.attributes.muscle_groups = groups.iter().map(|g| normalize_tag(g)).collect();
        self
    }

    pub fn with_equipment_needed(mut self, needed: &[&str]) -> Self {
        self.attributes.equipment_needed = needed.iter().map(|e| normalize_tag(e)).collect();
        self
    }

    pub fn with_injury_exclusions(mut self, injuries: &[&str]) -> Self {
        self.attributes.injury_exclusions = injuries.iter().map(|i| normalize_tag(i)).collect();
        self
    }

    pub fn with_alternatives(mut self, names: &[&str]) -> Self {
        self.attributes.alternatives = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// True when the exercise can be done without any equipment
    pub fn needs_no_equipment(&self) -> bool {
        self.attributes
            .equipment_needed
            .iter()
            .all(|eq| eq == "none")
    }

    pub fn allows_level(&self, level: FitnessLevel) -> bool {
        self.levels.contains(&level)
    }
}

// ============================================================================
// Pattern, Phase and Timing Types
// ============================================================================

/// Macro-structure governing how base exercises expand into a sequence
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrainingPattern {
    #[default]
    Standard,
    Circuit,
    Tabata,
    Pyramid,
}

impl TrainingPattern {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Some(TrainingPattern::Standard),
            "circuit" => Some(TrainingPattern::Circuit),
            "tabata" => Some(TrainingPattern::Tabata),
            "pyramid" => Some(TrainingPattern::Pyramid),
            _ => None,
        }
    }
}

impl fmt::Display for TrainingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingPattern::Standard => write!(f, "Standard"),
            TrainingPattern::Circuit => write!(f, "Circuit Training"),
            TrainingPattern::Tabata => write!(f, "Tabata Intervals"),
            TrainingPattern::Pyramid => write!(f, "Pyramid Training"),
        }
    }
}

/// Work or rest sub-period of one sequence item
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Rest,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Work => write!(f, "Work"),
            Phase::Rest => write!(f, "Rest"),
        }
    }
}

/// Session-wide default work/rest durations in seconds
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timing {
    pub work_seconds: u32,
    pub rest_seconds: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            work_seconds: 45,
            rest_seconds: 15,
        }
    }
}

/// User toggles for how cues are delivered (playback itself is external)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CueSettings {
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
        }
    }
}

/// Kind of cue emitted by the session timer
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    PhaseStart,
    NearEnd,
    Countdown,
    Complete,
}

/// A cue event for the external playback collaborator
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cue {
    pub kind: CueKind,
    pub phase: Phase,
    /// Seconds left in the phase when the cue fired
    pub remaining: u32,
}

// ============================================================================
// Sequence Types
// ============================================================================

/// What a sequence item places in the session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    Exercise { exercise: Exercise },
    /// Start of a circuit round
    RoundMarker { round: u32, total_rounds: u32 },
    /// Start of a tabata or pyramid set for one exercise
    SetMarker { exercise_name: String },
}

/// One placed entry of the session plan.
///
/// Section, round and level tags are fixed at construction; a swap only
/// replaces the exercise payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SequenceItem {
    pub(crate) kind: ItemKind,
    pub(crate) section: SectionType,
    pub(crate) pattern: TrainingPattern,
    pub(crate) round: Option<u32>,
    pub(crate) level: Option<u32>,
    pub(crate) ascending: Option<bool>,
    pub(crate) work_override: Option<u32>,
    pub(crate) rest_override: Option<u32>,
    #[serde(default)]
    pub(crate) last_round: bool,
    pub(crate) original_name: Option<String>,
    #[serde(default)]
    pub(crate) substituted: bool,
    #[serde(default)]
    pub(crate) suggested_alternative: Option<String>,
}

impl SequenceItem {
    /// A plain exercise entry with no pattern tags
    pub fn exercise(exercise: Exercise, section: SectionType) -> Self {
        let original_name = Some(exercise.name.clone());
        Self {
            kind: ItemKind::Exercise { exercise },
            section,
            pattern: TrainingPattern::Standard,
            round: None,
            level: None,
            ascending: None,
            work_override: None,
            rest_override: None,
            last_round: false,
            original_name,
            substituted: false,
            suggested_alternative: None,
        }
    }

    pub(crate) fn marker(kind: ItemKind, pattern: TrainingPattern, rest_seconds: u32) -> Self {
        Self {
            kind,
            section: SectionType::Main,
            pattern,
            round: None,
            level: None,
            ascending: None,
            // markers have no work phase
            work_override: Some(0),
            rest_override: Some(rest_seconds),
            last_round: false,
            original_name: None,
            substituted: false,
            suggested_alternative: None,
        }
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn section(&self) -> SectionType {
        self.section
    }

    pub fn pattern(&self) -> TrainingPattern {
        self.pattern
    }

    pub fn round(&self) -> Option<u32> {
        self.round
    }

    pub fn level(&self) -> Option<u32> {
        self.level
    }

    pub fn ascending(&self) -> Option<bool> {
        self.ascending
    }

    pub fn work_override(&self) -> Option<u32> {
        self.work_override
    }

    pub fn rest_override(&self) -> Option<u32> {
        self.rest_override
    }

    pub fn is_last_round(&self) -> bool {
        self.last_round
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn is_substituted(&self) -> bool {
        self.substituted
    }

    pub fn suggested_alternative(&self) -> Option<&str> {
        self.suggested_alternative.as_deref()
    }

    /// The exercise payload, `None` for markers
    pub fn as_exercise(&self) -> Option<&Exercise> {
        match &self.kind {
            ItemKind::Exercise { exercise } => Some(exercise),
            _ => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        !matches!(self.kind, ItemKind::Exercise { .. })
    }

    /// Work duration while this item is active
    pub fn effective_work(&self, timing: &Timing) -> u32 {
        self.work_override.unwrap_or(timing.work_seconds)
    }

    /// Rest duration while this item is active
    pub fn effective_rest(&self, timing: &Timing) -> u32 {
        self.rest_override.unwrap_or(timing.rest_seconds)
    }

    /// Name as shown in lists and in the player
    pub fn display_name(&self) -> String {
        match &self.kind {
            ItemKind::Exercise { exercise } => match (self.pattern, self.round, self.level) {
                (TrainingPattern::Circuit, Some(round), _) => {
                    format!("{} (Round {})", exercise.name, round)
                }
                (TrainingPattern::Tabata, Some(round), _) => {
                    format!("{} - Round {}", exercise.name, round)
                }
                (TrainingPattern::Pyramid, _, Some(level)) => {
                    format!("{} - Level {}", exercise.name, level)
                }
                _ => exercise.name.clone(),
            },
            ItemKind::RoundMarker {
                round,
                total_rounds,
            } => format!("Round {} of {}", round, total_rounds),
            ItemKind::SetMarker { exercise_name } => match self.pattern {
                TrainingPattern::Pyramid => format!("{} - Pyramid Set", exercise_name),
                _ => format!("{} - Tabata Set", exercise_name),
            },
        }
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Everything needed to run, persist and resume one workout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sequence: Vec<SequenceItem>,
    pub current_index: usize,
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub timing: Timing,
    pub paused: bool,
    pub pattern: PatternSettings,
    pub duration_minutes: u32,
    #[serde(default)]
    pub cues: CueSettings,
}

impl SessionState {
    /// Build a not-yet-started session: first item, Work phase
    pub fn new(
        sequence: Vec<SequenceItem>,
        timing: Timing,
        pattern: PatternSettings,
        duration_minutes: u32,
    ) -> Self {
        let remaining_seconds = sequence
            .first()
            .map(|item| item.effective_work(&timing))
            .unwrap_or(timing.work_seconds);

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            sequence,
            current_index: 0,
            phase: Phase::Work,
            remaining_seconds,
            timing,
            paused: false,
            pattern,
            duration_minutes,
            cues: CueSettings::default(),
        }
    }

    pub fn current_item(&self) -> Option<&SequenceItem> {
        self.sequence.get(self.current_index)
    }

    pub fn is_last_item(&self) -> bool {
        self.current_index + 1 >= self.sequence.len()
    }

    /// Duration of the given phase for the current item
    pub fn phase_duration(&self, phase: Phase) -> u32 {
        match (self.current_item(), phase) {
            (Some(item), Phase::Work) => item.effective_work(&self.timing),
            (Some(item), Phase::Rest) => item.effective_rest(&self.timing),
            (None, Phase::Work) => self.timing.work_seconds,
            (None, Phase::Rest) => self.timing.rest_seconds,
        }
    }

    /// Estimated length in whole minutes: every exercise's work plus the
    /// rest between consecutive exercises, markers excluded
    pub fn estimated_minutes(&self) -> u32 {
        let exercises: Vec<&SequenceItem> =
            self.sequence.iter().filter(|item| !item.is_marker()).collect();
        let Some((_, leading)) = exercises.split_last() else {
            return 0;
        };
        let work: u32 = exercises
            .iter()
            .map(|item| item.effective_work(&self.timing))
            .sum();
        let rest: u32 = leading
            .iter()
            .map(|item| item.effective_rest(&self.timing))
            .sum();
        (work + rest + 30) / 60
    }

    /// Items of one section, in sequence order
    pub fn section_items(&self, section: SectionType) -> impl Iterator<Item = &SequenceItem> {
        self.sequence.iter().filter(move |item| item.section == section)
    }
}

/// Handed to the reporting collaborator when a session completes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub items: usize,
    pub pattern: TrainingPattern,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The read-only exercise catalog, in catalog order
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
}
