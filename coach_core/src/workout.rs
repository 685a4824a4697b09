//! Workout authoring and duplication.
//!
//! A workout is visible only to its owner; anyone else gets `NotFound`.

use crate::store::{PrescriptionRepository, Store, WorkoutRepository};
use crate::types::*;
use crate::{Error, Result};
use chrono::Utc;

/// Fields for a new workout
#[derive(Clone, Debug, Default)]
pub struct NewWorkout {
    pub title: String,
    pub description: Option<String>,
    pub estimated_minutes: Option<u32>,
}

/// Partial update of a workout's scalar fields
#[derive(Clone, Debug, Default)]
pub struct WorkoutUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub estimated_minutes: Option<Option<u32>>,
}

/// Load a workout, concealing ones the actor does not own
pub(crate) fn owned_workout<R>(repos: &R, actor: &UserId, id: WorkoutId) -> Result<Workout>
where
    R: WorkoutRepository + ?Sized,
{
    match repos.workout(id)? {
        Some(workout) if &workout.owner_id == actor => Ok(workout),
        _ => Err(Error::not_found("workout", id)),
    }
}

/// Assemble a group with its entries
pub(crate) fn group_detail<R>(repos: &R, group: PrescriptionGroup) -> Result<GroupDetail>
where
    R: PrescriptionRepository + ?Sized,
{
    let exercises = repos.prescriptions_for_group(group.id)?;
    Ok(GroupDetail { group, exercises })
}

fn workout_detail<R>(repos: &R, workout: Workout) -> Result<WorkoutDetail>
where
    R: PrescriptionRepository + ?Sized,
{
    let groups = repos
        .groups_for_workout(workout.id)?
        .into_iter()
        .map(|g| group_detail(repos, g))
        .collect::<Result<Vec<_>>>()?;
    Ok(WorkoutDetail { workout, groups })
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("workout title must not be empty".into()));
    }
    Ok(title.to_string())
}

/// Workout CRUD and deep copy
pub struct WorkoutService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> WorkoutService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn create_workout(&self, actor: &UserId, new: NewWorkout) -> Result<Workout> {
        let workout = Workout {
            id: WorkoutId::new(),
            owner_id: actor.clone(),
            title: validate_title(&new.title)?,
            description: new.description,
            estimated_minutes: new.estimated_minutes,
            created_at: Utc::now(),
        };

        self.store
            .transaction(|repos| repos.insert_workout(workout.clone()))?;
        tracing::info!("Created workout {} '{}' for {}", workout.id, workout.title, actor);
        Ok(workout)
    }

    pub fn workout(&self, actor: &UserId, id: WorkoutId) -> Result<WorkoutDetail> {
        self.store.read(|repos| {
            let workout = owned_workout(repos, actor, id)?;
            workout_detail(repos, workout)
        })
    }

    pub fn list_workouts(&self, actor: &UserId) -> Result<Vec<Workout>> {
        self.store.read(|repos| repos.workouts_for_owner(actor))
    }

    pub fn update_workout(
        &self,
        actor: &UserId,
        id: WorkoutId,
        update: WorkoutUpdate,
    ) -> Result<Workout> {
        self.store.transaction(|repos| {
            let mut workout = owned_workout(repos, actor, id)?;
            if let Some(title) = update.title {
                workout.title = validate_title(&title)?;
            }
            if let Some(description) = update.description {
                workout.description = description;
            }
            if let Some(minutes) = update.estimated_minutes {
                workout.estimated_minutes = minutes;
            }
            repos.update_workout(workout.clone())?;
            Ok(workout)
        })
    }

    /// Delete a workout with its prescription structure; sessions are kept
    pub fn delete_workout(&self, actor: &UserId, id: WorkoutId) -> Result<()> {
        self.store.transaction(|repos| {
            owned_workout(repos, actor, id)?;
            repos.delete_workout(id)?;
            Ok(())
        })?;
        tracing::info!("Deleted workout {}", id);
        Ok(())
    }

    /// Deep-copy a workout's prescription structure under fresh IDs
    ///
    /// Orders and targets are kept identical; no session data is copied.
    pub fn duplicate_workout(&self, actor: &UserId, id: WorkoutId) -> Result<WorkoutDetail> {
        let detail = self.store.transaction(|repos| {
            let original = owned_workout(repos, actor, id)?;
            let copy = Workout {
                id: WorkoutId::new(),
                owner_id: original.owner_id.clone(),
                title: format!("{} (Copy)", original.title),
                description: original.description.clone(),
                estimated_minutes: original.estimated_minutes,
                created_at: Utc::now(),
            };
            repos.insert_workout(copy.clone())?;

            for group in repos.groups_for_workout(original.id)? {
                let group_copy = PrescriptionGroup {
                    id: GroupId::new(),
                    workout_id: copy.id,
                    ..group.clone()
                };
                repos.insert_group(group_copy.clone())?;

                for prescription in repos.prescriptions_for_group(group.id)? {
                    repos.insert_prescription(ExercisePrescription {
                        id: PrescriptionId::new(),
                        group_id: group_copy.id,
                        ..prescription
                    })?;
                }
            }

            workout_detail(repos, copy)
        })?;

        tracing::info!(
            "Duplicated workout {} into {} ({} groups)",
            id,
            detail.workout.id,
            detail.groups.len()
        );
        Ok(detail)
    }
}
