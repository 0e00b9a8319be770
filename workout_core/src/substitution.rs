//! Exercise substitution scoring.
//!
//! Two separate rankings over the catalog:
//! - `find_alternatives`: filtered, attribute-based suggestions (top 5)
//! - `find_similar`: label-based matches for an explicit swap (top 3)

use crate::types::*;
use std::collections::BTreeSet;
use std::fmt;

pub const MAX_ALTERNATIVES: usize = 5;
pub const MAX_SIMILAR: usize = 3;

/// What the person training has and must avoid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preferences {
    /// Equipment labels, normalized on comparison
    pub available_equipment: BTreeSet<String>,
    pub level: FitnessLevel,
    pub injury_limitations: BTreeSet<String>,
}

impl Preferences {
    pub fn new(level: FitnessLevel, equipment: &[String]) -> Self {
        Self {
            available_equipment: equipment.iter().map(|e| normalize_tag(e)).collect(),
            level,
            injury_limitations: BTreeSet::new(),
        }
    }

    pub fn with_injuries(mut self, injuries: &[String]) -> Self {
        self.injury_limitations = injuries.iter().map(|i| normalize_tag(i)).collect();
        self
    }

    fn covers(&self, required: &BTreeSet<String>) -> bool {
        required
            .iter()
            .filter(|tag| tag.as_str() != "none")
            .all(|tag| self.available_equipment.contains(tag))
    }
}

/// A ranked candidate
#[derive(Clone, Debug, PartialEq)]
pub struct Alternative<'a> {
    pub exercise: &'a Exercise,
    pub score: i32,
}

/// Why the best alternative is offered, judged against the target
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubstitutionReason {
    /// The target is unsafe for a listed injury
    Injury,
    /// The target is above the level's difficulty ceiling
    Difficulty,
    /// The target needs equipment that is not available
    Equipment(String),
    Muscle,
}

impl SubstitutionReason {
    fn judge(target: &Exercise, best: &Exercise, prefs: &Preferences) -> Self {
        let attrs = &target.attributes;
        if !attrs.injury_exclusions.is_disjoint(&prefs.injury_limitations) {
            SubstitutionReason::Injury
        } else if attrs.difficulty > prefs.level.ceiling() {
            SubstitutionReason::Difficulty
        } else if !target.needs_no_equipment() && !prefs.covers(&attrs.equipment_needed) {
            SubstitutionReason::Equipment(best.equipment.clone())
        } else {
            SubstitutionReason::Muscle
        }
    }
}

impl fmt::Display for SubstitutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubstitutionReason::Injury => write!(f, "Safer for your condition"),
            SubstitutionReason::Difficulty => write!(f, "More suitable difficulty level"),
            SubstitutionReason::Equipment(equipment) => {
                write!(f, "Better equipment match ({})", equipment)
            }
            SubstitutionReason::Muscle => write!(f, "Targets same muscle groups"),
        }
    }
}

/// Result of asking for an automatic substitution
#[derive(Clone, Debug, PartialEq)]
pub enum Suggestion<'a> {
    Suggested {
        best: Alternative<'a>,
        others: Vec<Alternative<'a>>,
        reason: SubstitutionReason,
    },
    NoAlternative {
        message: String,
    },
}

/// Ranked alternatives for `target`, best first.
///
/// Candidates must share the target's section, fit the available equipment,
/// sit at or below the level's difficulty ceiling, avoid every listed injury
/// and work at least one of the same muscle groups.
pub fn find_alternatives<'a>(
    catalog: &'a Catalog,
    target: &Exercise,
    prefs: &Preferences,
) -> Vec<Alternative<'a>> {
    let ceiling = prefs.level.ceiling();
    let target_groups = &target.attributes.muscle_groups;

    let mut ranked: Vec<Alternative<'a>> = catalog
        .exercises
        .iter()
        .filter(|ex| ex.section == target.section && ex.name != target.name)
        .filter(|ex| ex.needs_no_equipment() || prefs.covers(&ex.attributes.equipment_needed))
        .filter(|ex| ex.attributes.difficulty <= ceiling)
        .filter(|ex| {
            ex.attributes
                .injury_exclusions
                .is_disjoint(&prefs.injury_limitations)
        })
        .filter_map(|ex| {
            let shared = ex.attributes.muscle_groups.intersection(target_groups).count();
            if shared == 0 {
                return None;
            }
            let free = if ex.needs_no_equipment() { 3 } else { 0 };
            let closeness = 3 - (ex.attributes.difficulty as i32 - ceiling as i32).abs();
            Some(Alternative {
                exercise: ex,
                score: free + closeness + shared as i32,
            })
        })
        .collect();

    // sort_by is stable, so ties keep catalog order
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(MAX_ALTERNATIVES);

    tracing::debug!(
        "{} alternatives for '{}' at {}",
        ranked.len(),
        target.name,
        prefs.level
    );
    ranked
}

/// Label-based matches for an explicit swap, best first
pub fn find_similar<'a>(catalog: &'a Catalog, target: &Exercise) -> Vec<Alternative<'a>> {
    let mut ranked: Vec<Alternative<'a>> = catalog
        .exercises
        .iter()
        .filter(|ex| ex.section == target.section && ex.name != target.name)
        .map(|ex| {
            let same_muscle = ex.muscle == target.muscle;
            let same_equipment = ex.equipment == target.equipment;
            let level_overlap = ex.levels.iter().any(|l| target.levels.contains(l));

            let mut score = 0;
            if same_muscle {
                score += 10;
            }
            if same_equipment {
                score += 5;
            }
            if level_overlap {
                score += 3;
            }
            if same_muscle && same_equipment {
                score += 2;
            }
            Alternative { exercise: ex, score }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(MAX_SIMILAR);
    ranked
}

/// Wrap `find_alternatives` into a suggestion or an informational miss
pub fn suggest_substitution<'a>(
    catalog: &'a Catalog,
    target: &Exercise,
    prefs: &Preferences,
) -> Suggestion<'a> {
    let mut ranked = find_alternatives(catalog, target, prefs);
    if ranked.is_empty() {
        return Suggestion::NoAlternative {
            message: format!(
                "No suitable alternative for '{}' with the selected equipment and level",
                target.name
            ),
        };
    }
    let best = ranked.remove(0);
    let reason = SubstitutionReason::judge(target, best.exercise, prefs);
    Suggestion::Suggested {
        best,
        others: ranked,
        reason,
    }
}

/// Record the top automatic alternative on every exercise item
pub fn annotate_suggestions(catalog: &Catalog, items: &mut [SequenceItem], prefs: &Preferences) {
    for item in items.iter_mut() {
        let suggestion = match item.as_exercise() {
            Some(exercise) => find_alternatives(catalog, exercise, prefs)
                .first()
                .map(|alt| alt.exercise.name.clone()),
            None => None,
        };
        item.suggested_alternative = suggestion;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;

    fn legs(name: &str) -> Exercise {
        Exercise::new(
            name,
            BODYWEIGHT,
            &[FitnessLevel::Beginner],
            "Legs",
            SectionType::Main,
        )
    }

    fn bodyweight_beginner() -> Preferences {
        Preferences::new(FitnessLevel::Beginner, &[BODYWEIGHT.to_string()])
    }

    #[test]
    fn test_alternatives_for_shared_muscle() {
        let catalog = Catalog {
            exercises: vec![legs("A"), legs("B"), legs("C")],
        };
        let target = catalog.exercises[0].clone();

        let results = find_alternatives(&catalog, &target, &bodyweight_beginner());
        let names: Vec<_> = results.iter().map(|a| a.exercise.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
        // 3 (free) + 3 (difficulty 1 at ceiling 1) + 1 shared tag
        assert!(results.iter().all(|a| a.score == 7));
    }

    #[test]
    fn test_dumbbells_excluded_with_bodyweight_only() {
        let catalog = build_default_catalog();
        let target = catalog.find("Bodyweight Squats").unwrap().clone();
        let prefs = Preferences::new(FitnessLevel::Advanced, &[BODYWEIGHT.to_string()]);

        let results = find_alternatives(&catalog, &target, &prefs);
        assert!(!results.is_empty());
        assert!(results
            .iter()
            .all(|a| !a.exercise.attributes.equipment_needed.contains("dumbbells")));
        assert!(results.iter().all(|a| a.exercise.name != "Goblet Squats"));

        let with_dumbbells = Preferences::new(
            FitnessLevel::Advanced,
            &[BODYWEIGHT.to_string(), "Dumbbells".to_string()],
        );
        let results = find_alternatives(&catalog, &target, &with_dumbbells);
        assert!(results.iter().any(|a| a.exercise.name == "Goblet Squats"));
    }

    #[test]
    fn test_difficulty_ceiling_and_injuries() {
        let catalog = build_default_catalog();
        let target = catalog.find("Bodyweight Squats").unwrap().clone();

        let beginner = find_alternatives(&catalog, &target, &bodyweight_beginner());
        assert!(beginner.iter().all(|a| a.exercise.attributes.difficulty <= 1));

        let prefs = Preferences::new(FitnessLevel::Advanced, &[BODYWEIGHT.to_string()])
            .with_injuries(&["Knee Pain".to_string()]);
        let results = find_alternatives(&catalog, &target, &prefs);
        assert!(results.iter().all(|a| !a
            .exercise
            .attributes
            .injury_exclusions
            .contains("knee_pain")));
        assert!(results.iter().all(|a| a.exercise.name != "Jump Squats"));
    }

    #[test]
    fn test_alternatives_limited_and_sorted() {
        let mut exercises: Vec<Exercise> = (0..8).map(|i| legs(&format!("Leg {}", i))).collect();
        exercises.push(legs("Best").with_muscle_groups(&["legs", "glutes"]));
        let catalog = Catalog { exercises };
        let target = legs("Target").with_muscle_groups(&["legs", "glutes"]);

        let results = find_alternatives(&catalog, &target, &bodyweight_beginner());
        assert_eq!(results.len(), MAX_ALTERNATIVES);
        assert_eq!(results[0].exercise.name, "Best");
        assert_eq!(results[1].exercise.name, "Leg 0");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_similar_scoring() {
        let catalog = build_default_catalog();
        let target = catalog.find("Bodyweight Squats").unwrap().clone();

        let results = find_similar(&catalog, &target);
        assert_eq!(results.len(), MAX_SIMILAR);
        assert!(results.iter().all(|a| a.exercise.name != target.name));
        assert!(results.iter().all(|a| a.exercise.section == SectionType::Main));
        // same muscle, same equipment, overlapping level
        assert_eq!(results[0].score, 20);
        assert_eq!(results[0].exercise.name, "Reverse Lunges");
    }

    #[test]
    fn test_no_alternative_outcome() {
        let catalog = Catalog {
            exercises: vec![legs("Only")],
        };
        let target = catalog.exercises[0].clone();
        match suggest_substitution(&catalog, &target, &bodyweight_beginner()) {
            Suggestion::NoAlternative { message } => assert!(message.contains("Only")),
            other => panic!("expected no alternative, got {:?}", other),
        }
    }

    fn reason_for(catalog: &Catalog, target: &Exercise, prefs: &Preferences) -> SubstitutionReason {
        match suggest_substitution(catalog, target, prefs) {
            Suggestion::Suggested { reason, .. } => reason,
            other => panic!("expected a suggestion, got {:?}", other),
        }
    }

    #[test]
    fn test_suggestion_reasons() {
        let catalog = Catalog {
            exercises: vec![legs("A"), legs("B")],
        };
        let prefs = bodyweight_beginner();

        let reason = reason_for(&catalog, &catalog.exercises[0], &prefs);
        assert_eq!(reason, SubstitutionReason::Muscle);
        assert_eq!(reason.to_string(), "Targets same muscle groups");

        let hard = Exercise::new(
            "Pistol Squat",
            BODYWEIGHT,
            &[FitnessLevel::Advanced],
            "Legs",
            SectionType::Main,
        );
        assert_eq!(
            reason_for(&catalog, &hard, &prefs),
            SubstitutionReason::Difficulty
        );

        let loaded = Exercise::new(
            "Goblet Squat",
            "Dumbbells",
            &[FitnessLevel::Beginner],
            "Legs",
            SectionType::Main,
        );
        let reason = reason_for(&catalog, &loaded, &prefs);
        assert_eq!(reason, SubstitutionReason::Equipment(BODYWEIGHT.to_string()));
        assert_eq!(reason.to_string(), "Better equipment match (Bodyweight)");
    }

    #[test]
    fn test_injury_reason_wins() {
        let catalog = build_default_catalog();
        let target = catalog.find("Bodyweight Squats").unwrap().clone();
        let prefs = Preferences::new(FitnessLevel::Advanced, &[BODYWEIGHT.to_string()])
            .with_injuries(&["knee_pain".to_string()]);

        assert_eq!(
            reason_for(&catalog, &target, &prefs),
            SubstitutionReason::Injury
        );
    }

    #[test]
    fn test_annotate_skips_markers() {
        let catalog = Catalog {
            exercises: vec![legs("A"), legs("B")],
        };
        let mut items = vec![
            SequenceItem::marker(
                ItemKind::RoundMarker {
                    round: 1,
                    total_rounds: 2,
                },
                TrainingPattern::Circuit,
                0,
            ),
            SequenceItem::exercise(legs("A"), SectionType::Main),
        ];
        annotate_suggestions(&catalog, &mut items, &bodyweight_beginner());
        assert_eq!(items[0].suggested_alternative(), None);
        assert_eq!(items[1].suggested_alternative(), Some("B"));
    }
}
