use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use workout_core::*;

#[derive(Parser)]
#[command(name = "wkt")]
#[command(about = "Timed workout session generator and player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new session, replacing any saved one
    Generate {
        /// Fitness level (beginner, intermediate, advanced)
        #[arg(long)]
        level: Option<String>,

        /// Main session duration in minutes (15-60)
        #[arg(long)]
        duration: Option<u32>,

        /// Work seconds per exercise (20-120)
        #[arg(long)]
        work: Option<u32>,

        /// Rest seconds per exercise (10-60)
        #[arg(long)]
        rest: Option<u32>,

        /// Available equipment, repeatable (e.g. --equipment Dumbbells)
        #[arg(long)]
        equipment: Vec<String>,

        /// Training pattern (standard, circuit, tabata, pyramid)
        #[arg(long)]
        pattern: Option<String>,

        /// Circuit rounds or tabata rounds per exercise
        #[arg(long)]
        rounds: Option<u32>,

        /// Pyramid levels
        #[arg(long)]
        levels: Option<u32>,

        /// Distinct exercises in each circuit round
        #[arg(long)]
        exercises_per_round: Option<u32>,

        /// Rest between rounds, sets or levels in seconds
        #[arg(long)]
        pattern_rest: Option<u32>,

        /// Seed for reproducible exercise selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the saved session (default)
    Show,

    /// Rank automatic alternatives for an item
    Alternatives {
        /// Item number as shown by `show`
        item: usize,

        /// Injury limitations to avoid, repeatable (e.g. --injury knee_pain)
        #[arg(long)]
        injury: Vec<String>,

        /// Fitness level to rank for (defaults to config)
        #[arg(long)]
        level: Option<String>,

        /// Available equipment, repeatable (defaults to config)
        #[arg(long)]
        equipment: Vec<String>,
    },

    /// List exercises similar to an item for a manual swap
    Similar {
        /// Item number as shown by `show`
        item: usize,
    },

    /// Swap an item for a named exercise, or for the best alternative
    Swap {
        /// Item number as shown by `show`
        item: usize,

        /// Exercise name from the catalog; omitted picks the best alternative
        choice: Option<String>,
    },

    /// Run (or resume) the saved session
    Run {
        /// Milliseconds per tick
        #[arg(long, default_value_t = 1000)]
        tick_ms: u64,

        /// Stop after this many ticks, keeping the session for a later resume
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Switch timing preset before running (standard, tabata, hiit)
        #[arg(long)]
        preset: Option<String>,
    },

    /// Discard the saved session
    Reset,
}

fn main() -> Result<()> {
    // Initialize logging
    workout_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Generate {
            level,
            duration,
            work,
            rest,
            equipment,
            pattern,
            rounds,
            levels,
            exercises_per_round,
            pattern_rest,
            seed,
        }) => {
            let mut request = config.request();
            if let Some(level) = level {
                request.level = parse_level(&level)?;
            }
            if let Some(duration) = duration {
                request.duration_minutes = duration;
            }
            if let Some(work) = work {
                request.work_seconds = work;
            }
            if let Some(rest) = rest {
                request.rest_seconds = rest;
            }
            if !equipment.is_empty() {
                request.equipment = equipment;
            }
            if let Some(pattern) = pattern {
                let chosen = TrainingPattern::parse(&pattern).ok_or_else(|| {
                    Error::Validation(format!("Unknown training pattern: {}", pattern))
                })?;
                request.pattern = request.pattern.switch_to(chosen);
            }
            if let Some(rounds) = rounds {
                request.pattern.rounds = Some(rounds);
            }
            if let Some(levels) = levels {
                request.pattern.levels = Some(levels);
            }
            if let Some(count) = exercises_per_round {
                request.pattern.exercises_per_round = Some(count);
            }
            if let Some(rest) = pattern_rest {
                request.pattern.rest_seconds = Some(rest);
            }
            cmd_generate(&data_dir, &config, &request, seed)
        }
        Some(Commands::Show) | None => cmd_show(&data_dir),
        Some(Commands::Alternatives {
            item,
            injury,
            level,
            equipment,
        }) => {
            let prefs = preferences(&config, level, equipment)?.with_injuries(&injury);
            cmd_alternatives(&data_dir, &config, item, &prefs)
        }
        Some(Commands::Similar { item }) => cmd_similar(&data_dir, &config, item),
        Some(Commands::Swap { item, choice }) => cmd_swap(&data_dir, &config, item, choice),
        Some(Commands::Run {
            tick_ms,
            max_ticks,
            preset,
        }) => cmd_run(&data_dir, tick_ms, max_ticks, preset),
        Some(Commands::Reset) => cmd_reset(&data_dir),
    }
}

fn session_store(data_dir: &Path) -> SessionStore<FileStore> {
    SessionStore::new(FileStore::new(data_dir.join("session")))
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    match &config.data.catalog {
        Some(path) => Catalog::load_validated(path),
        None => Ok(get_default_catalog().clone()),
    }
}

fn parse_level(s: &str) -> Result<FitnessLevel> {
    FitnessLevel::parse(s).ok_or_else(|| Error::Validation(format!("Unknown fitness level: {}", s)))
}

fn preferences(config: &Config, level: Option<String>, equipment: Vec<String>) -> Result<Preferences> {
    let level = match level {
        Some(level) => parse_level(&level)?,
        None => config.session.level,
    };
    let equipment = if equipment.is_empty() {
        config.request().equipment()
    } else {
        equipment
    };
    Ok(Preferences::new(level, &equipment))
}

/// Load the saved session or explain how to create one
fn require_session(store: &SessionStore<FileStore>) -> Option<SessionState> {
    let state = store.load();
    if state.is_none() {
        println!("No saved session. Run `wkt generate` to create one.");
    }
    state
}

/// Resolve a 1-based item number to an exercise in the session
fn exercise_at(state: &SessionState, item: usize) -> Result<&Exercise> {
    item.checked_sub(1)
        .and_then(|index| state.sequence.get(index))
        .and_then(|entry| entry.as_exercise())
        .ok_or_else(|| {
            Error::Validation(format!(
                "Item {} is not an exercise (session has {} items)",
                item,
                state.sequence.len()
            ))
        })
}

fn cmd_generate(
    data_dir: &Path,
    config: &Config,
    request: &WorkoutRequest,
    seed: Option<u64>,
) -> Result<()> {
    let catalog = load_catalog(config)?;
    let state = match seed {
        Some(seed) => generate_session(&catalog, request, &mut StdRng::seed_from_u64(seed))?,
        None => generate_session(&catalog, request, &mut rand::rng())?,
    };

    let mut store = session_store(data_dir);
    if store.has_saved_session() {
        tracing::debug!("Replacing saved session in {:?}", data_dir);
        println!("Replacing the saved session.");
    }
    store.save(&state)?;
    tracing::debug!("Saved session {} with {} items", state.id, state.sequence.len());

    println!(
        "\n✓ Generated {} workout ({} min, {}s work / {}s rest, about {} min of exercise)",
        state.pattern.pattern,
        state.duration_minutes,
        state.timing.work_seconds,
        state.timing.rest_seconds,
        state.estimated_minutes()
    );
    display_session(&state);
    Ok(())
}

fn cmd_show(data_dir: &Path) -> Result<()> {
    let store = session_store(data_dir);
    if let Some(state) = require_session(&store) {
        display_session(&state);
    }
    Ok(())
}

fn cmd_alternatives(
    data_dir: &Path,
    config: &Config,
    item: usize,
    prefs: &Preferences,
) -> Result<()> {
    let store = session_store(data_dir);
    let Some(state) = require_session(&store) else {
        return Ok(());
    };
    let catalog = load_catalog(config)?;
    let target = exercise_at(&state, item)?;

    match suggest_substitution(&catalog, target, prefs) {
        Suggestion::Suggested {
            best,
            others,
            reason,
        } => {
            println!("\nAlternatives for {}:", target.name);
            println!("  ★ {} (score {}): {}", best.exercise.name, best.score, reason);
            for alt in others {
                println!("    {} (score {})", alt.exercise.name, alt.score);
            }
        }
        Suggestion::NoAlternative { message } => {
            println!("{}", message);
        }
    }
    Ok(())
}

fn cmd_similar(data_dir: &Path, config: &Config, item: usize) -> Result<()> {
    let store = session_store(data_dir);
    let Some(state) = require_session(&store) else {
        return Ok(());
    };
    let catalog = load_catalog(config)?;
    let target = exercise_at(&state, item)?;

    let similar = find_similar(&catalog, target);
    if similar.is_empty() {
        println!("No similar exercises for {}", target.name);
        return Ok(());
    }

    println!("\nSimilar to {}:", target.name);
    for alt in similar {
        println!(
            "  {} ({} • {}, score {})",
            alt.exercise.name, alt.exercise.muscle, alt.exercise.equipment, alt.score
        );
    }
    Ok(())
}

fn cmd_swap(data_dir: &Path, config: &Config, item: usize, choice: Option<String>) -> Result<()> {
    let Some(mut timer) = SessionTimer::restore(IntervalTicks::seconds(), session_store(data_dir))
    else {
        println!("No saved session. Run `wkt generate` to create one.");
        return Ok(());
    };
    let catalog = load_catalog(config)?;
    let index = item
        .checked_sub(1)
        .ok_or_else(|| Error::Validation("Item numbers start at 1".into()))?;

    let chosen = match choice {
        Some(name) => {
            let exercise = catalog
                .find(&name)
                .cloned()
                .ok_or_else(|| Error::Validation(format!("Unknown exercise: {}", name)))?;
            timer.apply(Transition::Swap {
                index,
                exercise: exercise.clone(),
            })?;
            exercise
        }
        None => {
            let prefs = preferences(config, None, Vec::new())?;
            timer.substitute_best(index, &catalog, &prefs)?
        }
    };

    tracing::debug!("Swapped item {} for '{}'", item, chosen.name);
    println!("✓ Item {} is now {}", item, chosen.name);
    Ok(())
}

fn cmd_run(
    data_dir: &Path,
    tick_ms: u64,
    max_ticks: Option<u64>,
    preset: Option<String>,
) -> Result<()> {
    let ticks = IntervalTicks::new(Duration::from_millis(tick_ms));
    let Some(mut timer) = SessionTimer::restore(ticks, session_store(data_dir)) else {
        println!("No saved session. Run `wkt generate` to create one.");
        return Ok(());
    };

    if let Some(name) = preset {
        let preset = TimingPreset::parse(&name)
            .ok_or_else(|| Error::Validation(format!("Unknown timing preset: {}", name)))?;
        timer.apply_preset(preset)?;
    }
    if timer.state().paused {
        timer.apply(Transition::Resume)?;
    }

    let outcome = timer.apply(Transition::Start)?;
    report(&timer, &outcome);

    let mut elapsed = 0u64;
    while !timer.is_finished() {
        if max_ticks.is_some_and(|max| elapsed >= max) {
            timer.apply(Transition::Stop)?;
            let view = timer.view();
            println!(
                "\nStopped at item {} ({:?} {}). Run `wkt run` to resume.",
                view.progress,
                view.phase,
                remaining_display(&view)
            );
            return Ok(());
        }

        let Some(id) = timer.ticks().wait() else {
            break;
        };
        let outcome = timer.apply(Transition::Tick(id))?;
        elapsed += 1;
        report(&timer, &outcome);
    }

    Ok(())
}

fn cmd_reset(data_dir: &Path) -> Result<()> {
    match SessionTimer::restore(IntervalTicks::seconds(), session_store(data_dir)) {
        Some(mut timer) => {
            timer.apply(Transition::Reset)?;
            println!("✓ Session discarded");
        }
        None => {
            // clear whatever unreadable value is left in the slot
            session_store(data_dir).clear()?;
            println!("No saved session.");
        }
    }
    Ok(())
}

fn remaining_display(view: &TimerView) -> &str {
    match view.phase {
        Phase::Work => &view.work_display,
        Phase::Rest => &view.rest_display,
    }
}

fn report<T: TickSource, S: Store>(timer: &SessionTimer<T, S>, outcome: &Outcome) {
    let cues = timer.state().cues;
    if cues.sound || cues.vibration {
        for cue in &outcome.cues {
            match cue.kind {
                CueKind::PhaseStart => println!("\n▶ {}", cue.phase),
                CueKind::Countdown => println!("  {}…", cue.remaining),
                CueKind::NearEnd => println!("  ♪ {}", cue.remaining),
                CueKind::Complete => {}
            }
        }
    }

    if let Some(done) = &outcome.completed {
        let minutes = (done.completed_at - done.started_at).num_minutes();
        println!("\n✓ Workout complete! Great job!");
        println!("  {} items • {} • {} min", done.items, done.pattern, minutes);
        return;
    }

    let view = timer.view();
    match &view.upcoming {
        Some(next) => println!(
            "  [{}] {}  {}  → next: {}",
            view.phase,
            remaining_display(&view),
            view.progress,
            next
        ),
        None => println!(
            "  [{}] {}  {} • {}{}",
            view.phase,
            remaining_display(&view),
            view.progress,
            view.current,
            if view.paused { " (paused)" } else { "" }
        ),
    }
}

fn display_session(state: &SessionState) {
    let mut section = None;
    for (i, item) in state.sequence.iter().enumerate() {
        if section != Some(item.section()) {
            section = Some(item.section());
            println!("\n── {} ──", item.section());
        }

        let marker = if i == state.current_index { "▸" } else { " " };
        let timing = if item.is_marker() {
            match item.effective_rest(&state.timing) {
                0 => String::new(),
                rest => format!("{}s rest", rest),
            }
        } else {
            format!(
                "{}s / {}s",
                item.effective_work(&state.timing),
                item.effective_rest(&state.timing)
            )
        };

        let mut line = format!("{} {:>3}. {}", marker, i + 1, item.display_name());
        if !timing.is_empty() {
            line.push_str(&format!("  [{}]", timing));
        }
        if item.is_substituted() {
            if let Some(original) = item.original_name() {
                line.push_str(&format!("  (swapped from {})", original));
            }
        }
        if let Some(alt) = item.suggested_alternative() {
            line.push_str(&format!("  alt: {}", alt));
        }
        println!("{}", line);
    }

    println!(
        "\n{} items • ~{} min • at item {} ({:?}, {}s left){}",
        state.sequence.len(),
        state.estimated_minutes(),
        state.current_index + 1,
        state.phase,
        state.remaining_seconds,
        if state.paused { " • paused" } else { "" }
    );
}
