//! Session timer state machine.
//!
//! `SessionTimer` exclusively owns the `SessionState` and changes it only
//! through `apply`. Every transition that moves the session to another
//! item, phase or timing cancels the armed tick first, then mutates, then
//! re-arms if the session is still running. Ticks carrying a cancelled id
//! are ignored.
//!
//! After each mutation the state is written to the session slot. A failed
//! write is logged and never undoes the transition.

use crate::engine::validate_timing;
use crate::scheduler::{TickId, TickSource};
use crate::sequence::SequenceBuilder;
use crate::store::{SessionStore, Store};
use crate::substitution::{find_alternatives, Preferences};
use crate::types::*;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last seconds of a work phase that get a countdown cue
const COUNTDOWN_SECONDS: u32 = 5;
/// Last seconds of a rest phase that get a near-end cue
const NEAR_END_SECONDS: u32 = 3;

/// Named work/rest presets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingPreset {
    Standard,
    Tabata,
    Hiit,
    Custom { work: u32, rest: u32 },
}

impl TimingPreset {
    pub fn timing(self) -> Timing {
        let (work_seconds, rest_seconds) = match self {
            TimingPreset::Standard => (45, 15),
            TimingPreset::Tabata => (20, 10),
            TimingPreset::Hiit => (30, 15),
            TimingPreset::Custom { work, rest } => (work, rest),
        };
        Timing {
            work_seconds,
            rest_seconds,
        }
    }

    /// Parse a named preset (custom presets are built directly)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Some(TimingPreset::Standard),
            "tabata" => Some(TimingPreset::Tabata),
            "hiit" => Some(TimingPreset::Hiit),
            _ => None,
        }
    }
}

/// Input to the state machine
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    Start,
    Tick(TickId),
    Pause,
    Resume,
    TogglePause,
    Next,
    Previous,
    /// New session-wide timing; the running phase is rescaled
    Reconfigure(Timing),
    Swap { index: usize, exercise: Exercise },
    /// Leave the session, keeping the saved slot for a later resume
    Stop,
    /// Discard the session and its saved slot
    Reset,
}

/// Where the timer is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Not started, or stopped
    Idle,
    Running,
    Completed,
    Discarded,
}

/// What a transition produced
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    pub cues: Vec<Cue>,
    pub completed: Option<CompletionReport>,
}

impl Outcome {
    fn cue(&mut self, kind: CueKind, phase: Phase, remaining: u32) {
        self.cues.push(Cue {
            kind,
            phase,
            remaining,
        });
    }
}

/// Display snapshot of the running session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerView {
    pub phase: Phase,
    pub work_display: String,
    pub rest_display: String,
    pub current: String,
    pub section: SectionType,
    /// Name of the item that follows, only shown while resting
    pub upcoming: Option<String>,
    pub progress: String,
    pub paused: bool,
}

/// Format seconds as mm:ss
pub fn format_mm_ss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Remaining time after switching a running phase to a new duration,
/// keeping the elapsed share of the phase.
pub fn rescale_remaining(old_duration: u32, old_remaining: u32, new_duration: u32) -> u32 {
    if old_duration == 0 {
        return new_duration;
    }
    let elapsed = (old_duration as f64 - old_remaining as f64) / old_duration as f64;
    let scaled = (new_duration as f64 * (1.0 - elapsed)).round();
    scaled.max(1.0) as u32
}

pub struct SessionTimer<T: TickSource, S: Store> {
    state: SessionState,
    ticks: T,
    store: SessionStore<S>,
    status: Status,
    started_at: Option<DateTime<Utc>>,
}

impl<T: TickSource, S: Store> SessionTimer<T, S> {
    /// Take ownership of a session; it is saved immediately
    pub fn new(state: SessionState, ticks: T, store: SessionStore<S>) -> Result<Self> {
        if state.sequence.is_empty() {
            return Err(Error::Validation("Session has no items".into()));
        }
        if state.current_index >= state.sequence.len() {
            return Err(Error::Validation(format!(
                "Current item {} outside sequence of {}",
                state.current_index,
                state.sequence.len()
            )));
        }

        let mut timer = Self {
            state,
            ticks,
            store,
            status: Status::Idle,
            started_at: None,
        };
        timer.persist();
        Ok(timer)
    }

    /// Resume the saved session, if there is a usable one
    pub fn restore(ticks: T, store: SessionStore<S>) -> Option<Self> {
        let state = store.load()?;
        tracing::info!(
            "Restored session {} at item {} ({:?}, {}s left)",
            state.id,
            state.current_index,
            state.phase,
            state.remaining_seconds
        );
        Some(Self {
            state,
            ticks,
            store,
            status: Status::Idle,
            started_at: None,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    pub fn ticks_mut(&mut self) -> &mut T {
        &mut self.ticks
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, Status::Completed | Status::Discarded)
    }

    /// Single entry point for every state change
    pub fn apply(&mut self, transition: Transition) -> Result<Outcome> {
        let mut outcome = Outcome::default();

        if self.is_finished() {
            tracing::debug!("Ignoring {:?}: session is {:?}", transition, self.status);
            return Ok(outcome);
        }

        match transition {
            Transition::Start => self.start(&mut outcome),
            Transition::Tick(id) => {
                if !self.tick(id, &mut outcome) {
                    return Ok(outcome);
                }
            }
            Transition::Pause => self.set_paused(true),
            Transition::Resume => self.set_paused(false),
            Transition::TogglePause => self.set_paused(!self.state.paused),
            Transition::Next => self.next(&mut outcome),
            Transition::Previous => {
                if !self.previous(&mut outcome) {
                    return Ok(outcome);
                }
            }
            Transition::Reconfigure(timing) => self.reconfigure(timing)?,
            Transition::Swap { index, exercise } => self.swap(index, exercise)?,
            Transition::Stop => {
                self.ticks.cancel();
                self.status = Status::Idle;
                tracing::info!("Stopped session {}", self.state.id);
            }
            Transition::Reset => {
                self.reset();
                return Ok(outcome);
            }
        }

        self.persist();
        Ok(outcome)
    }

    /// Swap in the best automatic alternative for the item at `index`.
    ///
    /// Leaves the item untouched when no candidate survives filtering.
    pub fn substitute_best(
        &mut self,
        index: usize,
        catalog: &Catalog,
        prefs: &Preferences,
    ) -> Result<Exercise> {
        let target = self
            .state
            .sequence
            .get(index)
            .and_then(|item| item.as_exercise())
            .ok_or_else(|| Error::Validation(format!("Item {} is not an exercise", index)))?;

        let best = find_alternatives(catalog, target, prefs)
            .first()
            .map(|alt| alt.exercise.clone())
            .ok_or_else(|| {
                Error::NoAlternative(format!(
                    "'{}' has no alternative for the selected equipment and level",
                    target.name
                ))
            })?;

        self.apply(Transition::Swap {
            index,
            exercise: best.clone(),
        })?;
        Ok(best)
    }

    /// Switch the session timing to a named preset
    pub fn apply_preset(&mut self, preset: TimingPreset) -> Result<Outcome> {
        self.apply(Transition::Reconfigure(preset.timing()))
    }

    pub fn view(&self) -> TimerView {
        let state = &self.state;
        let (work, rest) = match state.phase {
            Phase::Work => (
                state.remaining_seconds,
                state.phase_duration(Phase::Rest),
            ),
            Phase::Rest => (
                state.phase_duration(Phase::Work),
                state.remaining_seconds,
            ),
        };

        let current = state.current_item();
        let upcoming = match state.phase {
            Phase::Rest => state
                .sequence
                .get(state.current_index + 1)
                .map(|item| item.display_name()),
            Phase::Work => None,
        };

        TimerView {
            phase: state.phase,
            work_display: format_mm_ss(work),
            rest_display: format_mm_ss(rest),
            current: current.map(|item| item.display_name()).unwrap_or_default(),
            section: current
                .map(|item| item.section())
                .unwrap_or(SectionType::Main),
            upcoming,
            progress: format!("{} / {}", state.current_index + 1, state.sequence.len()),
            paused: state.paused,
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn start(&mut self, outcome: &mut Outcome) {
        if self.status == Status::Running {
            return;
        }
        self.status = Status::Running;
        self.started_at.get_or_insert_with(Utc::now);

        let fresh_phase = self.state.remaining_seconds == self.state.phase_duration(self.state.phase);
        if self.state.remaining_seconds == 0 {
            self.finish_phase(outcome);
        } else if fresh_phase {
            outcome.cue(CueKind::PhaseStart, self.state.phase, self.state.remaining_seconds);
        }

        if self.status == Status::Running {
            self.ticks.start();
        }
        tracing::info!(
            "Started session {} at item {}",
            self.state.id,
            self.state.current_index
        );
    }

    /// Returns false when the tick was ignored
    fn tick(&mut self, id: TickId, outcome: &mut Outcome) -> bool {
        if self.status != Status::Running {
            tracing::debug!("Ignoring tick {:?}: session not running", id);
            return false;
        }
        if self.ticks.active() != Some(id) {
            tracing::warn!(
                "Ignoring stale tick {:?} (active {:?})",
                id,
                self.ticks.active()
            );
            return false;
        }
        if self.state.paused {
            return false;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        let remaining = self.state.remaining_seconds;

        match self.state.phase {
            _ if remaining == 0 => self.finish_phase(outcome),
            Phase::Work if remaining <= COUNTDOWN_SECONDS => {
                outcome.cue(CueKind::Countdown, Phase::Work, remaining)
            }
            Phase::Rest if remaining <= NEAR_END_SECONDS => {
                outcome.cue(CueKind::NearEnd, Phase::Rest, remaining)
            }
            _ => {}
        }
        true
    }

    /// Leave the current phase; zero-length phases are passed straight through
    fn finish_phase(&mut self, outcome: &mut Outcome) {
        loop {
            match self.state.phase {
                Phase::Work => {
                    self.state.phase = Phase::Rest;
                    self.state.remaining_seconds = self.state.phase_duration(Phase::Rest);
                }
                Phase::Rest => {
                    if self.state.is_last_item() {
                        self.complete(outcome);
                        return;
                    }
                    self.state.current_index += 1;
                    self.state.phase = Phase::Work;
                    self.state.remaining_seconds = self.state.phase_duration(Phase::Work);
                }
            }

            tracing::debug!(
                "Item {} entered {:?} ({}s)",
                self.state.current_index,
                self.state.phase,
                self.state.remaining_seconds
            );

            if self.state.remaining_seconds > 0 {
                outcome.cue(
                    CueKind::PhaseStart,
                    self.state.phase,
                    self.state.remaining_seconds,
                );
                return;
            }
        }
    }

    fn complete(&mut self, outcome: &mut Outcome) {
        self.ticks.cancel();
        self.status = Status::Completed;
        self.state.remaining_seconds = 0;

        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear saved session: {}", e);
        }

        outcome.cue(CueKind::Complete, self.state.phase, 0);
        let report = CompletionReport {
            session_id: self.state.id,
            started_at: self.started_at.unwrap_or(self.state.created_at),
            completed_at: Utc::now(),
            items: self.state.sequence.len(),
            pattern: self.state.pattern.pattern,
        };
        tracing::info!(
            "Completed session {} ({} items)",
            report.session_id,
            report.items
        );
        outcome.completed = Some(report);
    }

    fn set_paused(&mut self, paused: bool) {
        self.state.paused = paused;
        tracing::debug!("Paused: {}", paused);
    }

    /// Cancel the armed tick; returns whether it was running
    fn halt(&mut self) -> bool {
        let running = self.status == Status::Running;
        self.ticks.cancel();
        running
    }

    fn rearm(&mut self, was_running: bool) {
        if was_running && self.status == Status::Running {
            self.ticks.start();
        }
    }

    /// Enter the work phase of `index` with a fresh counter
    fn enter_item(&mut self, index: usize, outcome: &mut Outcome) {
        self.state.current_index = index;
        self.state.phase = Phase::Work;
        self.state.paused = false;
        self.state.remaining_seconds = self.state.phase_duration(Phase::Work);
        outcome.cue(CueKind::PhaseStart, Phase::Work, self.state.remaining_seconds);
    }

    fn next(&mut self, outcome: &mut Outcome) {
        let was_running = self.halt();

        let target = (self.state.current_index + 1..self.state.sequence.len())
            .find(|&i| !self.state.sequence[i].is_marker());
        match target {
            Some(index) => {
                self.enter_item(index, outcome);
                self.rearm(was_running);
            }
            None => self.complete(outcome),
        }
    }

    /// Returns false when there is nothing before the current item
    fn previous(&mut self, outcome: &mut Outcome) -> bool {
        let target = (0..self.state.current_index)
            .rev()
            .find(|&i| !self.state.sequence[i].is_marker());
        let Some(index) = target else {
            return false;
        };

        let was_running = self.halt();
        self.enter_item(index, outcome);
        self.rearm(was_running);
        true
    }

    fn reconfigure(&mut self, timing: Timing) -> Result<()> {
        validate_timing(&timing)?;

        let was_running = self.halt();
        let phase = self.state.phase;
        let old_duration = self.state.phase_duration(phase);
        let old_remaining = self.state.remaining_seconds;

        self.state.timing = timing;
        let new_duration = self.state.phase_duration(phase);
        if new_duration != old_duration {
            self.state.remaining_seconds =
                rescale_remaining(old_duration, old_remaining, new_duration);
        }

        tracing::debug!(
            "Reconfigured to {}/{}: {:?} {}s -> {}s",
            timing.work_seconds,
            timing.rest_seconds,
            phase,
            old_remaining,
            self.state.remaining_seconds
        );
        self.rearm(was_running);
        Ok(())
    }

    fn swap(&mut self, index: usize, exercise: Exercise) -> Result<()> {
        SequenceBuilder::check_swap(&self.state.sequence, index, &exercise)?;

        let was_running = self.halt();
        SequenceBuilder::swap(&mut self.state.sequence, index, exercise)?;
        self.rearm(was_running);
        Ok(())
    }

    fn reset(&mut self) {
        self.ticks.cancel();
        self.status = Status::Discarded;
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear saved session: {}", e);
        }
        tracing::info!("Discarded session {}", self.state.id);
    }

    fn persist(&mut self) {
        if self.is_finished() {
            return;
        }
        if let Err(e) = self.store.save(&self.state) {
            tracing::warn!("Failed to save session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test;
    use crate::pattern::{generate, Pattern, PatternSettings};
    use crate::scheduler::{ManualTicks, TickEvent};
    use crate::store::MemoryStore;

    type TestTimer = SessionTimer<ManualTicks, MemoryStore>;

    fn ex(name: &str) -> Exercise {
        Exercise::new(
            name,
            BODYWEIGHT,
            &[FitnessLevel::Beginner],
            "Legs",
            SectionType::Main,
        )
    }

    fn plain(n: usize) -> Vec<SequenceItem> {
        (0..n)
            .map(|i| SequenceItem::exercise(ex(&format!("Exercise {}", i)), SectionType::Main))
            .collect()
    }

    fn timer_with(sequence: Vec<SequenceItem>, timing: Timing) -> TestTimer {
        init_test();
        let state = SessionState::new(sequence, timing, PatternSettings::default(), 30);
        SessionTimer::new(state, ManualTicks::new(), SessionStore::new(MemoryStore::new())).unwrap()
    }

    fn started(sequence: Vec<SequenceItem>, timing: Timing) -> TestTimer {
        let mut timer = timer_with(sequence, timing);
        timer.apply(Transition::Start).unwrap();
        timer
    }

    fn tick(timer: &mut TestTimer) -> Outcome {
        let id = timer.ticks().active().expect("armed tick");
        timer.apply(Transition::Tick(id)).unwrap()
    }

    fn ticks(timer: &mut TestTimer, n: u32) -> Vec<Cue> {
        (0..n).flat_map(|_| tick(timer).cues).collect()
    }

    fn short() -> Timing {
        Timing {
            work_seconds: 10,
            rest_seconds: 4,
        }
    }

    #[test]
    fn test_work_runs_into_rest_after_r_ticks() {
        let mut timer = started(plain(3), short());
        assert_eq!(timer.state().remaining_seconds, 10);

        let cues = ticks(&mut timer, 10);
        assert_eq!(timer.state().phase, Phase::Rest);
        assert_eq!(timer.state().remaining_seconds, 4);
        assert_eq!(timer.state().current_index, 0);

        let countdown: Vec<_> = cues
            .iter()
            .filter(|c| c.kind == CueKind::Countdown)
            .map(|c| c.remaining)
            .collect();
        assert_eq!(countdown, vec![5, 4, 3, 2, 1]);
        assert_eq!(
            cues.last(),
            Some(&Cue {
                kind: CueKind::PhaseStart,
                phase: Phase::Rest,
                remaining: 4
            })
        );
    }

    #[test]
    fn test_rest_runs_into_next_item() {
        let mut timer = started(plain(3), short());
        ticks(&mut timer, 10);

        let cues = ticks(&mut timer, 4);
        assert_eq!(timer.state().current_index, 1);
        assert_eq!(timer.state().phase, Phase::Work);
        assert_eq!(timer.state().remaining_seconds, 10);

        let near_end: Vec<_> = cues
            .iter()
            .filter(|c| c.kind == CueKind::NearEnd)
            .map(|c| c.remaining)
            .collect();
        assert_eq!(near_end, vec![3, 2, 1]);
    }

    #[test]
    fn test_pause_freezes_remaining() {
        let mut timer = started(plain(2), short());
        ticks(&mut timer, 3);
        assert_eq!(timer.state().remaining_seconds, 7);

        timer.apply(Transition::Pause).unwrap();
        ticks(&mut timer, 5);
        assert_eq!(timer.state().remaining_seconds, 7);
        // the tick source keeps running while paused
        assert!(timer.ticks().active().is_some());

        timer.apply(Transition::Resume).unwrap();
        ticks(&mut timer, 2);
        assert_eq!(timer.state().remaining_seconds, 5);

        timer.apply(Transition::TogglePause).unwrap();
        assert!(timer.state().paused);
    }

    #[test]
    fn test_next_cancels_before_moving() {
        let mut timer = started(plain(3), short());
        ticks(&mut timer, 2);
        let stale = timer.ticks().active().unwrap();
        timer.ticks_mut().clear_log();

        timer.apply(Transition::Next).unwrap();
        assert_eq!(timer.state().current_index, 1);
        assert_eq!(timer.state().remaining_seconds, 10);

        let fresh = timer.ticks().active().unwrap();
        assert_eq!(
            timer.ticks().log(),
            &[TickEvent::Cancelled(stale), TickEvent::Started(fresh)]
        );

        // a tick armed before the navigation cannot touch the new item
        let outcome = timer.apply(Transition::Tick(stale)).unwrap();
        assert!(outcome.cues.is_empty());
        assert_eq!(timer.state().remaining_seconds, 10);

        tick(&mut timer);
        assert_eq!(timer.state().remaining_seconds, 9);
    }

    #[test]
    fn test_navigation_unpauses_and_resets_counter() {
        let mut timer = started(plain(3), short());
        ticks(&mut timer, 10);
        timer.apply(Transition::Pause).unwrap();
        assert_eq!(timer.state().phase, Phase::Rest);

        timer.apply(Transition::Next).unwrap();
        assert!(!timer.state().paused);
        assert_eq!(timer.state().phase, Phase::Work);
        assert_eq!(timer.state().remaining_seconds, 10);

        timer.apply(Transition::Previous).unwrap();
        assert_eq!(timer.state().current_index, 0);
        assert_eq!(timer.state().remaining_seconds, 10);
    }

    #[test]
    fn test_previous_on_first_item_is_noop() {
        let mut timer = started(plain(2), short());
        ticks(&mut timer, 3);
        let armed = timer.ticks().active();

        let outcome = timer.apply(Transition::Previous).unwrap();
        assert!(outcome.cues.is_empty());
        assert_eq!(timer.state().current_index, 0);
        assert_eq!(timer.state().remaining_seconds, 7);
        assert_eq!(timer.ticks().active(), armed);
    }

    #[test]
    fn test_next_on_last_item_completes() {
        let mut timer = started(plain(2), short());
        timer.apply(Transition::Next).unwrap();
        let outcome = timer.apply(Transition::Next).unwrap();

        assert_eq!(timer.status(), Status::Completed);
        assert!(outcome.completed.is_some());
        assert!(outcome.cues.iter().any(|c| c.kind == CueKind::Complete));
        assert_eq!(timer.ticks().active(), None);
    }

    #[test]
    fn test_completion_clears_saved_session() {
        let mut timer = started(plain(1), short());
        assert!(timer.store().has_saved_session());
        assert_eq!(timer.store().inner().len(), 1);

        ticks(&mut timer, 10);
        assert!(timer.store().has_saved_session());
        let id = timer.ticks().active().unwrap();
        let cues = ticks(&mut timer, 4);

        assert_eq!(timer.status(), Status::Completed);
        assert_eq!(cues.last().map(|c| c.kind), Some(CueKind::Complete));
        assert!(!timer.store().has_saved_session());
        assert!(timer.store().inner().is_empty());
        assert_eq!(timer.ticks().active(), None);

        // further input is ignored once complete
        let outcome = timer.apply(Transition::Tick(id)).unwrap();
        assert_eq!(outcome, Outcome::default());
        assert!(!timer.store().has_saved_session());
    }

    #[test]
    fn test_rescale_keeps_elapsed_share() {
        assert_eq!(rescale_remaining(45, 20, 20), 9);
        assert_eq!(rescale_remaining(60, 30, 40), 20);
        assert_eq!(rescale_remaining(60, 1, 20), 1);
        assert_eq!(rescale_remaining(0, 0, 30), 30);

        let mut timer = started(plain(2), Timing::default());
        ticks(&mut timer, 25);
        assert_eq!(timer.state().remaining_seconds, 20);

        timer
            .apply(Transition::Reconfigure(Timing {
                work_seconds: 20,
                rest_seconds: 10,
            }))
            .unwrap();
        assert_eq!(timer.state().remaining_seconds, 9);
        assert_eq!(timer.state().timing.work_seconds, 20);
        assert!(timer.ticks().active().is_some());
    }

    #[test]
    fn test_rescale_during_rest() {
        let mut timer = started(
            plain(2),
            Timing {
                work_seconds: 20,
                rest_seconds: 40,
            },
        );
        ticks(&mut timer, 20);
        assert_eq!(timer.state().phase, Phase::Rest);
        ticks(&mut timer, 10);
        assert_eq!(timer.state().remaining_seconds, 30);

        timer
            .apply(Transition::Reconfigure(Timing {
                work_seconds: 20,
                rest_seconds: 20,
            }))
            .unwrap();
        assert_eq!(timer.state().phase, Phase::Rest);
        assert_eq!(timer.state().remaining_seconds, 15);
        assert_eq!(timer.state().current_index, 0);

        let saved = timer.store().load().unwrap();
        assert_eq!(saved.remaining_seconds, 15);
        assert_eq!(saved.timing.rest_seconds, 20);
    }

    #[test]
    fn test_reconfigure_rejects_bad_timing() {
        let mut timer = started(plain(2), Timing::default());
        let armed = timer.ticks().active();
        let result = timer.apply(Transition::Reconfigure(Timing {
            work_seconds: 5,
            rest_seconds: 10,
        }));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(timer.state().timing, Timing::default());
        assert_eq!(timer.ticks().active(), armed);
    }

    #[test]
    fn test_preset_applies_timing() {
        let mut timer = timer_with(plain(2), Timing::default());
        timer.apply_preset(TimingPreset::Hiit).unwrap();
        assert_eq!(timer.state().timing, TimingPreset::Hiit.timing());
        // not started: the full phase rescales to the full new duration
        assert_eq!(timer.state().remaining_seconds, 30);
    }

    #[test]
    fn test_override_reverts_on_next_item() {
        let tabata = generate(
            &[ex("Squat")],
            &Pattern::Tabata {
                rounds_per_exercise: 1,
                rest_after_set: 30,
            },
        );
        // [set marker, tabata round, plain item]
        let mut sequence = tabata;
        sequence.extend(plain(1));

        let mut timer = started(sequence, short());
        // marker has no work and no rest before the first set
        assert_eq!(timer.state().current_index, 1);
        assert_eq!(timer.state().remaining_seconds, 20);

        ticks(&mut timer, 20);
        assert_eq!(timer.state().phase, Phase::Rest);
        assert_eq!(timer.state().remaining_seconds, 10);

        ticks(&mut timer, 10);
        assert_eq!(timer.state().current_index, 2);
        assert_eq!(timer.state().remaining_seconds, 10);
        ticks(&mut timer, 10);
        assert_eq!(timer.state().remaining_seconds, 4);
    }

    #[test]
    fn test_round_marker_carries_round_rest() {
        let sequence = generate(
            &[ex("Squat")],
            &Pattern::Circuit {
                rounds: 2,
                rest_between: 30,
            },
        );
        // [marker r1, squat r1, marker r2, squat r2]
        let mut timer = started(sequence, short());
        assert_eq!(timer.state().current_index, 1);

        ticks(&mut timer, 10 + 4);
        assert_eq!(timer.state().current_index, 2);
        assert_eq!(timer.state().phase, Phase::Rest);
        assert_eq!(timer.state().remaining_seconds, 30);
        assert_eq!(timer.view().current, "Round 2 of 2");
        assert_eq!(timer.view().upcoming.as_deref(), Some("Squat (Round 2)"));

        ticks(&mut timer, 30);
        assert_eq!(timer.state().current_index, 3);
        assert_eq!(timer.state().phase, Phase::Work);
    }

    #[test]
    fn test_navigation_skips_markers() {
        let sequence = generate(
            &[ex("Squat")],
            &Pattern::Circuit {
                rounds: 2,
                rest_between: 30,
            },
        );
        let mut timer = started(sequence, short());
        timer.apply(Transition::Next).unwrap();
        assert_eq!(timer.state().current_index, 3);

        timer.apply(Transition::Previous).unwrap();
        assert_eq!(timer.state().current_index, 1);
    }

    #[test]
    fn test_state_saved_after_each_tick() {
        let mut timer = started(plain(2), short());
        ticks(&mut timer, 3);

        let saved = timer.store().load().unwrap();
        assert_eq!(saved.remaining_seconds, 7);
        assert_eq!(saved.current_index, 0);
        assert_eq!(saved.id, timer.state().id);
    }

    #[test]
    fn test_failed_save_does_not_block_transitions() {
        init_test();
        let state = SessionState::new(plain(2), short(), PatternSettings::default(), 30);
        let mut timer =
            SessionTimer::new(state, ManualTicks::new(), SessionStore::new(MemoryStore::failing()))
                .unwrap();
        timer.apply(Transition::Start).unwrap();
        let id = timer.ticks().active().unwrap();
        timer.apply(Transition::Tick(id)).unwrap();
        assert_eq!(timer.state().remaining_seconds, 9);
    }

    #[test]
    fn test_restore_resumes_mid_phase() {
        let mut timer = started(plain(3), short());
        ticks(&mut timer, 12);
        timer.apply(Transition::Stop).unwrap();
        assert_eq!(timer.ticks().active(), None);

        let store = SessionStore::new(timer.store().inner().clone());
        let mut restored = SessionTimer::restore(ManualTicks::new(), store).unwrap();
        assert_eq!(restored.state().phase, Phase::Rest);
        assert_eq!(restored.state().remaining_seconds, 2);

        // resuming mid-phase gives no phase-start cue
        let outcome = restored.apply(Transition::Start).unwrap();
        assert!(outcome.cues.is_empty());
        let id = restored.ticks().active().unwrap();
        restored.apply(Transition::Tick(id)).unwrap();
        assert_eq!(restored.state().remaining_seconds, 1);
    }

    #[test]
    fn test_reset_discards_session() {
        let mut timer = started(plain(2), short());
        timer.apply(Transition::Reset).unwrap();
        assert_eq!(timer.status(), Status::Discarded);
        assert!(!timer.store().has_saved_session());
        assert_eq!(timer.ticks().active(), None);
    }

    #[test]
    fn test_swap_keeps_running_phase() {
        let mut timer = started(plain(2), short());
        ticks(&mut timer, 3);

        timer
            .apply(Transition::Swap {
                index: 0,
                exercise: ex("Wall Sit"),
            })
            .unwrap();
        assert_eq!(timer.state().remaining_seconds, 7);
        let item = &timer.state().sequence[0];
        assert_eq!(item.as_exercise().unwrap().name, "Wall Sit");
        assert!(item.is_substituted());

        let saved = timer.store().load().unwrap();
        assert!(saved.sequence[0].is_substituted());
    }

    #[test]
    fn test_substitute_best_without_candidates() {
        let mut timer = started(plain(2), short());
        let catalog = Catalog {
            exercises: vec![ex("Exercise 0")],
        };
        let prefs = Preferences::new(FitnessLevel::Beginner, &[BODYWEIGHT.to_string()]);

        let result = timer.substitute_best(0, &catalog, &prefs);
        assert!(matches!(result, Err(Error::NoAlternative(_))));
        assert_eq!(
            timer.state().sequence[0].as_exercise().unwrap().name,
            "Exercise 0"
        );
        assert!(!timer.state().sequence[0].is_substituted());

        let catalog = Catalog {
            exercises: vec![ex("Exercise 0"), ex("Lunge")],
        };
        let chosen = timer.substitute_best(0, &catalog, &prefs).unwrap();
        assert_eq!(chosen.name, "Lunge");
        assert!(timer.state().sequence[0].is_substituted());
    }

    #[test]
    fn test_view_and_format() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(65), "01:05");
        assert_eq!(format_mm_ss(600), "10:00");

        let mut timer = started(plain(2), short());
        let view = timer.view();
        assert_eq!(view.work_display, "00:10");
        assert_eq!(view.rest_display, "00:04");
        assert_eq!(view.progress, "1 / 2");
        assert_eq!(view.upcoming, None);

        ticks(&mut timer, 11);
        let view = timer.view();
        assert_eq!(view.phase, Phase::Rest);
        assert_eq!(view.rest_display, "00:03");
        assert_eq!(view.upcoming.as_deref(), Some("Exercise 1"));
    }
}
