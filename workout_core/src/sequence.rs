//! Session sequence assembly.

use crate::types::*;
use crate::{Error, Result};

/// Joins the three workout sections into one session sequence
pub struct SequenceBuilder;

impl SequenceBuilder {
    /// Warm-up, then the expanded main items, then cool-down.
    ///
    /// Every item is tagged with the section it was placed in.
    pub fn build(
        warmup: &[Exercise],
        main: Vec<SequenceItem>,
        cooldown: &[Exercise],
    ) -> Vec<SequenceItem> {
        let mut sequence = Vec::with_capacity(warmup.len() + main.len() + cooldown.len());

        sequence.extend(
            warmup
                .iter()
                .map(|ex| SequenceItem::exercise(ex.clone(), SectionType::Warmup)),
        );
        sequence.extend(main.into_iter().map(|mut item| {
            item.section = SectionType::Main;
            item
        }));
        sequence.extend(
            cooldown
                .iter()
                .map(|ex| SequenceItem::exercise(ex.clone(), SectionType::Cooldown)),
        );

        sequence
    }

    /// Check that `exercise` may replace the item at `index`.
    ///
    /// The replacement must belong to the slot's section; markers cannot be
    /// swapped.
    pub fn check_swap(sequence: &[SequenceItem], index: usize, exercise: &Exercise) -> Result<()> {
        let item = sequence.get(index).ok_or_else(|| {
            Error::Validation(format!(
                "Item {} out of range (sequence has {})",
                index,
                sequence.len()
            ))
        })?;

        if item.is_marker() {
            return Err(Error::Validation(format!(
                "'{}' is a marker and cannot be swapped",
                item.display_name()
            )));
        }

        if exercise.section != item.section {
            return Err(Error::Validation(format!(
                "'{}' is a {} exercise, slot {} is {}",
                exercise.name, exercise.section, index, item.section
            )));
        }

        Ok(())
    }

    /// Replace the exercise at `index`, keeping every tag of the slot
    pub fn swap(sequence: &mut [SequenceItem], index: usize, exercise: Exercise) -> Result<()> {
        Self::check_swap(sequence, index, &exercise)?;
        let item = &mut sequence[index];

        if item.original_name.is_none() {
            item.original_name = item.as_exercise().map(|current| current.name.clone());
        }
        item.substituted = item.original_name.as_deref() != Some(exercise.name.as_str());
        item.suggested_alternative = None;

        tracing::debug!("Swapped item {} to '{}'", index, exercise.name);
        item.kind = ItemKind::Exercise { exercise };
        Ok(())
    }
}
