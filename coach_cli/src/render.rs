//! Human-readable output for the CLI.
//!
//! Weights are stored in kg and shown in the configured display unit.

use coach_core::catalog::{Exercise, RpeValue};
use coach_core::units::from_kg;
use coach_core::*;

fn weight(kg: Option<f64>, unit: WeightUnit) -> String {
    match kg {
        Some(kg) => format!(" @ {:.1} {}", from_kg(kg, unit), unit),
        None => String::new(),
    }
}

fn quantity(reps: Option<u32>, hold_seconds: Option<u32>) -> String {
    match (reps, hold_seconds) {
        (Some(reps), _) => format!("{} reps", reps),
        (None, Some(secs)) => format!("{}s hold", secs),
        (None, None) => "-".into(),
    }
}

pub fn workouts(workouts: &[Workout]) {
    if workouts.is_empty() {
        println!("No workouts.");
        return;
    }
    for w in workouts {
        println!("{}  {}", w.id, w.title);
    }
}

pub fn workout(detail: &WorkoutDetail, unit: WeightUnit) {
    let w = &detail.workout;
    println!("{}", w.title);
    println!("  id: {}", w.id);
    if let Some(description) = &w.description {
        println!("  {}", description);
    }
    if let Some(minutes) = w.estimated_minutes {
        println!("  ~{} min", minutes);
    }
    println!();
    for group in &detail.groups {
        self::group(group, unit);
    }
}

pub fn group(detail: &GroupDetail, unit: WeightUnit) {
    let g = &detail.group;
    let name = g.group_name.as_deref().unwrap_or("");
    println!("[{}] {} {}  ({})", g.group_order, g.group_type, name, g.id);
    if let Some(rounds) = g.group_rounds {
        println!("    rounds: {}", rounds);
    }
    if let Some(rest) = g.rest_between_sets {
        println!("    rest: {}s", rest);
    }
    for p in &detail.exercises {
        let sets = p.sets.map(|s| format!("{} x ", s)).unwrap_or_default();
        println!(
            "    {}. {}  {}{}{}",
            p.exercise_order,
            p.exercise_id,
            sets,
            quantity(p.quantity.reps(), p.quantity.hold_seconds()),
            weight(p.target_weight_kg, unit)
        );
    }
}

pub fn sessions(sessions: &[WorkoutSession]) {
    if sessions.is_empty() {
        println!("No sessions.");
        return;
    }
    for s in sessions {
        let state = if s.completed { "ended" } else { "open" };
        println!(
            "{}  {}  {}  (by {})",
            s.id,
            s.started_at.format("%Y-%m-%d %H:%M"),
            state,
            s.created_by_id
        );
    }
}

pub fn session(detail: &SessionDetail, unit: WeightUnit) {
    let s = &detail.session;
    println!("Session {} for {}", s.id, s.user_id);
    if s.is_trainer_logged() {
        println!("  logged by {}", s.created_by_id);
    }
    println!("  started: {}", s.started_at.format("%Y-%m-%d %H:%M"));
    match s.ended_at {
        Some(ended) => println!("  ended: {}", ended.format("%Y-%m-%d %H:%M")),
        None => println!("  in progress"),
    }
    if let Some(intensity) = s.perceived_intensity {
        println!("  intensity: {}/10", intensity);
    }
    if let Some(notes) = &s.notes {
        println!("  notes: {}", notes);
    }
    println!();
    for b in &detail.blocks {
        block(b, unit);
    }
}

pub fn block(detail: &BlockDetail, unit: WeightUnit) {
    let b = &detail.block;
    println!("Block {} [{}]  ({})", b.block_order, b.progress(), b.id);
    if let Some(rpe) = b.perceived_exertion {
        println!("  exertion: {}/10", rpe);
    }
    for log in &detail.exercises {
        exercise_log(log, unit);
    }
}

pub fn exercise_log(detail: &ExerciseLogDetail, unit: WeightUnit) {
    let l = &detail.log;
    println!(
        "  {}. {} [{}]  ({})",
        l.exercise_order,
        l.exercise_id,
        l.progress(),
        l.id
    );
    if let Some(notes) = &l.notes {
        println!("     notes: {}", notes);
    }
    for s in &detail.sets {
        set(s, unit);
    }
}

pub fn set(s: &SessionSet, unit: WeightUnit) {
    let mark = if s.completed { "x" } else { " " };
    let failure = if s.was_failure { " (failure)" } else { "" };
    println!(
        "     [{}] set {}: {}{}{}  ({})",
        mark,
        s.set_number,
        quantity(s.actual_reps, s.hold_seconds_actual),
        weight(s.actual_weight_kg, unit),
        failure,
        s.id
    );
}

pub fn catalog(exercises: &[&Exercise], rpe_values: &[&RpeValue]) {
    println!("Exercises:");
    for e in exercises {
        match &e.equipment {
            Some(equipment) => println!("  {:<16} {} ({})", e.id.as_str(), e.name, equipment),
            None => println!("  {:<16} {}", e.id.as_str(), e.name),
        }
    }
    println!();
    println!("RPE scale:");
    for v in rpe_values {
        println!("  {:>2}  {:<7} {}", v.id.0, v.label, v.description);
    }
}
