//! Exercise and RPE-scale catalogs.
//!
//! Both catalogs are read-only collaborators of the prescription and session
//! services: they are consulted by ID and never mutated by this crate. A
//! built-in default is provided and a replacement can be loaded from TOML.

use crate::types::{ExerciseId, RpeValueId};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// An exercise known to the catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub muscles: Vec<String>,
}

/// One point on an RPE scale
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RpeValue {
    pub id: RpeValueId,
    pub value: f32,
    pub label: String,
    pub description: String,
}

/// Read-only lookup into the exercise catalog
pub trait ExerciseCatalog {
    fn exercise(&self, id: &ExerciseId) -> Option<Exercise>;
}

/// Read-only lookup into the RPE-scale catalog
///
/// Scale ownership (global, trainer-private, shared with clients) is the
/// catalog's concern; a value it returns is one the caller may reference.
pub trait RpeCatalog {
    fn rpe_value(&self, id: RpeValueId) -> Option<RpeValue>;
}

/// Typed lookup table for exercises and RPE values
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: HashMap<ExerciseId, Exercise>,
    pub rpe_values: BTreeMap<RpeValueId, RpeValue>,
}

/// On-disk catalog format
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    exercises: Vec<Exercise>,
    #[serde(default)]
    rpe_values: Vec<RpeValue>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

impl ExerciseCatalog for Catalog {
    fn exercise(&self, id: &ExerciseId) -> Option<Exercise> {
        self.exercises.get(id).cloned()
    }
}

impl RpeCatalog for Catalog {
    fn rpe_value(&self, id: RpeValueId) -> Option<RpeValue> {
        self.rpe_values.get(&id).cloned()
    }
}

impl Catalog {
    /// Load a catalog from a TOML file, rejecting duplicate IDs
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&contents)?;

        let mut catalog = Catalog::default();
        for exercise in file.exercises {
            let id = exercise.id.clone();
            if catalog.exercises.insert(id.clone(), exercise).is_some() {
                return Err(Error::CatalogValidation(format!(
                    "duplicate exercise id '{}'",
                    id
                )));
            }
        }
        for value in file.rpe_values {
            let id = value.id;
            if catalog.rpe_values.insert(id, value).is_some() {
                return Err(Error::CatalogValidation(format!(
                    "duplicate RPE value id {}",
                    id
                )));
            }
        }

        tracing::info!(
            "Loaded catalog from {:?} ({} exercises, {} RPE values)",
            path,
            catalog.exercises.len(),
            catalog.rpe_values.len()
        );
        Ok(catalog)
    }

    /// Validate catalog consistency, returning one message per problem
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, exercise) in &self.exercises {
            if id != &exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise id '{}'",
                    id, exercise.id
                ));
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty name", id));
            }
        }

        for (id, value) in &self.rpe_values {
            if id != &value.id {
                errors.push(format!(
                    "RPE key {} doesn't match value id {}",
                    id, value.id
                ));
            }
            if !(1.0..=10.0).contains(&value.value) {
                errors.push(format!(
                    "RPE value {} is outside 1-10: {}",
                    id, value.value
                ));
            }
            if value.label.trim().is_empty() {
                errors.push(format!("RPE value {} has empty label", id));
            }
        }

        if self.exercises.is_empty() {
            errors.push("Catalog has no exercises".to_string());
        }

        errors
    }
}

fn exercise(id: &str, name: &str, equipment: Option<&str>, muscles: &[&str]) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        equipment: equipment.map(Into::into),
        muscles: muscles.iter().map(|m| (*m).to_string()).collect(),
    }
}

fn rpe(id: u32, value: f32, label: &str, description: &str) -> RpeValue {
    RpeValue {
        id: RpeValueId(id),
        value,
        label: label.into(),
        description: description.into(),
    }
}

/// Builds the default catalog with built-in exercises and the RPE 6-10 scale
///
/// Prefer `get_default_catalog()` for a cached reference.
pub fn build_default_catalog() -> Catalog {
    let exercises = vec![
        exercise("squat", "Back Squat", Some("barbell"), &["quads", "glutes"]),
        exercise("bench_press", "Bench Press", Some("barbell"), &["pecs", "triceps"]),
        exercise("deadlift", "Deadlift", Some("barbell"), &["hamstrings", "glutes", "erector_spinae"]),
        exercise("overhead_press", "Overhead Press", Some("barbell"), &["front_delts", "triceps"]),
        exercise("barbell_row", "Barbell Row", Some("barbell"), &["lats", "rear_delts"]),
        exercise("pullup", "Pull-up", Some("pullup_bar"), &["lats", "biceps"]),
        exercise("pushup", "Push-up", None, &["pecs", "triceps"]),
        exercise("plank", "Plank", None, &["abs"]),
        exercise("dead_hang", "Dead Hang", Some("pullup_bar"), &["forearms"]),
        exercise("lunge", "Walking Lunge", Some("dumbbell"), &["quads", "glutes"]),
        exercise("kb_swing", "Kettlebell Swing", Some("kettlebell"), &["hamstrings", "glutes"]),
    ];

    let rpe_values = vec![
        rpe(1, 6.0, "RPE 6", "Light effort, 4+ reps in reserve"),
        rpe(2, 7.0, "RPE 7", "Moderate effort, 3 reps in reserve"),
        rpe(3, 8.0, "RPE 8", "Hard, 2 reps in reserve"),
        rpe(4, 9.0, "RPE 9", "Very hard, 1 rep in reserve"),
        rpe(5, 10.0, "RPE 10", "Maximal effort, no reps in reserve"),
    ];

    Catalog {
        exercises: exercises.into_iter().map(|e| (e.id.clone(), e)).collect(),
        rpe_values: rpe_values.into_iter().map(|v| (v.id, v)).collect(),
    }
}
