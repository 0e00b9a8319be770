//! Default exercise catalog and catalog loading.
//!
//! The built-in catalog is a small sample covering every section. Custom
//! catalogs are loaded from JSON records whose extended attributes are
//! optional; missing attributes are defaulted here, once, at load time.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::types::FitnessLevel::{Advanced, Beginner, Intermediate};
use crate::types::SectionType::{Cooldown, Main, Warmup};

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

const ALL_LEVELS: &[FitnessLevel] = &[Beginner, Intermediate, Advanced];

fn build_default_catalog_internal() -> Catalog {
    let exercises = vec![
        // ====================================================================
        // Warm-up
        // ====================================================================
        Exercise::new("Arm Circles", BODYWEIGHT, &[Beginner], "Shoulders", Warmup)
            .with_description("Small to large circles, forward then backward.")
            .with_difficulty(1)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["deltoids", "trapezius"])
            .with_alternatives(&["Shoulder Rolls", "Arm Swings"]),
        Exercise::new("Shoulder Rolls", BODYWEIGHT, ALL_LEVELS, "Shoulders", Warmup)
            .with_description("Slow backward then forward shoulder rolls.")
            .with_muscle_groups(&["deltoids", "trapezius"]),
        Exercise::new("Leg Swings", BODYWEIGHT, &[Beginner], "Legs", Warmup)
            .with_description("Hold a wall and swing one leg forward and back.")
            .with_difficulty(1)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["quadriceps", "hamstrings", "glutes"])
            .with_injury_exclusions(&["hip_pain"]),
        Exercise::new("Marching in Place", BODYWEIGHT, ALL_LEVELS, "Legs", Warmup)
            .with_description("Drive the knees up at an easy pace.")
            .with_muscle_groups(&["quadriceps", "hip_flexors"]),
        Exercise::new("Jumping Jacks", BODYWEIGHT, ALL_LEVELS, "Full Body", Warmup)
            .with_description("Jump feet apart while raising the arms overhead."),
        Exercise::new("Hip Circles", BODYWEIGHT, ALL_LEVELS, "Hips", Warmup)
            .with_description("Hands on hips, draw wide circles with the pelvis."),
        Exercise::new("Band Pull-Aparts", "Resistance Band", ALL_LEVELS, "Shoulders", Warmup)
            .with_description("Pull the band apart at chest height, squeezing the shoulder blades.")
            .with_muscle_groups(&["rear_deltoids", "trapezius"]),
        // ====================================================================
        // Main
        // ====================================================================
        Exercise::new("Bodyweight Squats", BODYWEIGHT, ALL_LEVELS, "Legs", Main)
            .with_description("Sit the hips back and down, knees tracking the toes.")
            .with_difficulty(1)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["quadriceps", "glutes", "hamstrings"])
            .with_injury_exclusions(&["knee_pain"]),
        Exercise::new("Reverse Lunges", BODYWEIGHT, ALL_LEVELS, "Legs", Main)
            .with_description("Step back and lower the rear knee toward the floor.")
            .with_difficulty(2)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["quadriceps", "glutes"])
            .with_injury_exclusions(&["knee_pain"]),
        Exercise::new("Glute Bridges", BODYWEIGHT, ALL_LEVELS, "Legs", Main)
            .with_description("Drive through the heels and lift the hips.")
            .with_difficulty(1)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["glutes", "hamstrings"]),
        Exercise::new("Jump Squats", BODYWEIGHT, &[Intermediate, Advanced], "Legs", Main)
            .with_description("Squat, then explode upward and land softly.")
            .with_difficulty(3)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["quadriceps", "glutes", "calves"])
            .with_injury_exclusions(&["knee_pain", "ankle_pain"]),
        Exercise::new("Push-ups", BODYWEIGHT, &[Intermediate, Advanced], "Chest", Main)
            .with_description("Lower the chest to the floor with a rigid body line.")
            .with_difficulty(2)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["chest", "triceps", "shoulders"])
            .with_injury_exclusions(&["wrist_pain"]),
        Exercise::new("Incline Push-ups", BODYWEIGHT, ALL_LEVELS, "Chest", Main)
            .with_description("Hands on a bench or wall, lower the chest toward it.")
            .with_difficulty(1)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["chest", "triceps"]),
        Exercise::new("Plank", BODYWEIGHT, ALL_LEVELS, "Core", Main)
            .with_description("Hold a straight line from head to heels on the forearms.")
            .with_difficulty(1)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["abs", "obliques"]),
        Exercise::new("Mountain Climbers", BODYWEIGHT, &[Intermediate, Advanced], "Core", Main)
            .with_description("From a high plank, drive the knees toward the chest.")
            .with_difficulty(2)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["abs", "hip_flexors", "shoulders"])
            .with_injury_exclusions(&["wrist_pain"]),
        Exercise::new("Burpees", BODYWEIGHT, &[Advanced], "Full Body", Main)
            .with_description("Squat, kick back to a plank, return and jump.")
            .with_difficulty(3)
            .with_equipment_needed(&["none"])
            .with_muscle_groups(&["quadriceps", "chest", "abs"])
            .with_injury_exclusions(&["knee_pain", "wrist_pain"]),
        Exercise::new("Goblet Squats", "Dumbbells", ALL_LEVELS, "Legs", Main)
            .with_description("Hold a dumbbell at the chest and squat.")
            .with_difficulty(2)
            .with_equipment_needed(&["dumbbells"])
            .with_muscle_groups(&["quadriceps", "glutes"]),
        Exercise::new("Dumbbell Rows", "Dumbbells", ALL_LEVELS, "Back", Main)
            .with_description("Hinge forward and row the dumbbell to the hip.")
            .with_difficulty(2)
            .with_equipment_needed(&["dumbbells"])
            .with_muscle_groups(&["lats", "rhomboids", "biceps"]),
        Exercise::new("Kettlebell Swings", "Kettlebell", &[Intermediate, Advanced], "Legs", Main)
            .with_description("Hinge and snap the hips to swing the bell to chest height.")
            .with_difficulty(3)
            .with_equipment_needed(&["kettlebell"])
            .with_muscle_groups(&["glutes", "hamstrings"])
            .with_injury_exclusions(&["back_pain"]),
        Exercise::new("Band Rows", "Resistance Band", ALL_LEVELS, "Back", Main)
            .with_description("Anchor the band and row the handles to the ribs.")
            .with_muscle_groups(&["lats", "rhomboids"]),
        Exercise::new("Superman Hold", BODYWEIGHT, ALL_LEVELS, "Back", Main)
            .with_description("Lie face down and lift arms and legs off the floor."),
        // ====================================================================
        // Cool-down
        // ====================================================================
        Exercise::new("Child's Pose", BODYWEIGHT, ALL_LEVELS, "Back", Cooldown)
            .with_description("Sit back on the heels with arms extended forward."),
        Exercise::new("Hamstring Stretch", BODYWEIGHT, ALL_LEVELS, "Legs", Cooldown)
            .with_description("Hinge over a straight leg until a gentle stretch is felt.")
            .with_muscle_groups(&["hamstrings"]),
        Exercise::new("Quad Stretch", BODYWEIGHT, ALL_LEVELS, "Legs", Cooldown)
            .with_description("Pull the heel toward the glute, knees together.")
            .with_muscle_groups(&["quadriceps"]),
        Exercise::new("Chest Opener", BODYWEIGHT, ALL_LEVELS, "Chest", Cooldown)
            .with_description("Clasp the hands behind the back and lift the chest."),
        Exercise::new("Cat-Cow", BODYWEIGHT, ALL_LEVELS, "Back", Cooldown)
            .with_description("Alternate arching and rounding the spine on all fours."),
        Exercise::new("Deep Breathing", BODYWEIGHT, ALL_LEVELS, "Full Body", Cooldown)
            .with_description("Slow nasal inhale, long exhale."),
    ];

    Catalog { exercises }
}

// ============================================================================
// JSON Catalog Records
// ============================================================================

/// A level field may be a single name or a list of names
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LevelField {
    One(FitnessLevel),
    Many(Vec<FitnessLevel>),
}

impl LevelField {
    fn into_vec(self) -> Vec<FitnessLevel> {
        match self {
            LevelField::One(level) => vec![level],
            LevelField::Many(levels) => levels,
        }
    }
}

/// Raw catalog record as found in catalog files
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    name: String,
    #[serde(default)]
    description: String,
    equipment: String,
    level: LevelField,
    muscle: String,
    #[serde(rename = "type")]
    section: SectionType,
    #[serde(default)]
    difficulty: Option<u8>,
    #[serde(default)]
    muscle_groups: Option<Vec<String>>,
    #[serde(default)]
    equipment_needed: Option<Vec<String>>,
    #[serde(default, alias = "injury_safe")]
    injury_exclusions: Option<Vec<String>>,
    #[serde(default)]
    alternatives: Option<Vec<String>>,
}

impl From<CatalogRecord> for Exercise {
    fn from(record: CatalogRecord) -> Self {
        let levels = record.level.into_vec();
        let mut attributes = ExtendedAttributes::derived(&levels, &record.muscle, &record.equipment);

        if let Some(difficulty) = record.difficulty {
            attributes.difficulty = difficulty;
        }
        if let Some(groups) = record.muscle_groups {
            attributes.muscle_groups = groups.iter().map(|g| normalize_tag(g)).collect();
        }
        if let Some(needed) = record.equipment_needed {
            attributes.equipment_needed = needed.iter().map(|e| normalize_tag(e)).collect();
        }
        if let Some(injuries) = record.injury_exclusions {
            attributes.injury_exclusions = injuries.iter().map(|i| normalize_tag(i)).collect();
        }
        if let Some(alternatives) = record.alternatives {
            attributes.alternatives = alternatives;
        }

        Exercise {
            name: record.name,
            description: record.description,
            equipment: record.equipment,
            levels,
            muscle: record.muscle,
            section: record.section,
            attributes,
        }
    }
}

impl Catalog {
    /// Parse a catalog from a JSON array of records
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<CatalogRecord> = serde_json::from_str(json)?;
        let exercises = records.into_iter().map(Exercise::from).collect();
        Ok(Catalog { exercises })
    }

    /// Load a catalog from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded {} exercises from {:?}",
            catalog.exercises.len(),
            path
        );
        Ok(catalog)
    }

    /// Load and validate, failing on the first batch of problems
    pub fn load_validated(path: &Path) -> Result<Self> {
        let catalog = Self::load_from(path)?;
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        Ok(catalog)
    }

    /// Look up an exercise by exact name
    pub fn find(&self, name: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|ex| ex.name == name)
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for exercise in &self.exercises {
            if exercise.name.trim().is_empty() {
                errors.push("Exercise has empty name".to_string());
                continue;
            }
            if !seen.insert(exercise.name.as_str()) {
                errors.push(format!("Duplicate exercise name '{}'", exercise.name));
            }
            if exercise.levels.is_empty() {
                errors.push(format!("Exercise '{}' allows no fitness level", exercise.name));
            }
            if !(1..=3).contains(&exercise.attributes.difficulty) {
                errors.push(format!(
                    "Exercise '{}': difficulty {} outside 1..=3",
                    exercise.name, exercise.attributes.difficulty
                ));
            }
            if exercise.equipment.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty equipment", exercise.name));
            }
        }

        for section in [Warmup, Main, Cooldown] {
            if !self.exercises.iter().any(|ex| ex.section == section) {
                errors.push(format!("Catalog has no {} exercises", section));
            }
        }

        errors
    }
}
