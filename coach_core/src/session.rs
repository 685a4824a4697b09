//! Session instantiation and session-level operations.
//!
//! Creating a session from a workout compiles the prescription into a
//! tracking structure: one block per group, one exercise log per
//! prescription, and `effective_sets` pre-filled sets per log. The whole
//! structure is written in a single transaction.

use crate::auth::{AccessResolver, TrainerClientDirectory};
use crate::prescription::effective_sets;
use crate::store::{PrescriptionRepository, SessionRepository, Store, WorkoutRepository};
use crate::types::*;
use crate::{Error, Result};
use chrono::{DateTime, Utc};

/// Upper bound of the perceived exertion / intensity scale
pub const MAX_EFFORT: u8 = 10;

/// Reject effort ratings outside 1..=10
pub(crate) fn validate_effort(field: &str, value: Option<u8>) -> Result<()> {
    match value {
        Some(v) if !(1..=MAX_EFFORT).contains(&v) => Err(Error::Validation(format!(
            "{} must be between 1 and {}, got {}",
            field, MAX_EFFORT, v
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn exercise_log_detail<R>(repos: &R, log: SessionExerciseLog) -> Result<ExerciseLogDetail>
where
    R: SessionRepository + ?Sized,
{
    let sets = repos.sets_for_exercise_log(log.id)?;
    Ok(ExerciseLogDetail { log, sets })
}

pub(crate) fn block_detail<R>(repos: &R, block: SessionBlock) -> Result<BlockDetail>
where
    R: SessionRepository + ?Sized,
{
    let exercises = repos
        .exercise_logs_for_block(block.id)?
        .into_iter()
        .map(|log| exercise_log_detail(repos, log))
        .collect::<Result<Vec<_>>>()?;
    Ok(BlockDetail { block, exercises })
}

pub(crate) fn session_detail<R>(repos: &R, session: WorkoutSession) -> Result<SessionDetail>
where
    R: SessionRepository + ?Sized,
{
    let blocks = repos
        .blocks_for_session(session.id)?
        .into_iter()
        .map(|block| block_detail(repos, block))
        .collect::<Result<Vec<_>>>()?;
    Ok(SessionDetail { session, blocks })
}

/// Build the tracking structure for `workout_id` under `session_id`
fn instantiate<R>(repos: &mut R, session_id: SessionId, workout_id: WorkoutId) -> Result<()>
where
    R: PrescriptionRepository + SessionRepository + ?Sized,
{
    for group in repos.groups_for_workout(workout_id)? {
        let block = SessionBlock {
            id: BlockId::new(),
            session_id,
            block_order: group.group_order,
            completed_at: None,
            skipped: false,
            perceived_exertion: None,
        };
        repos.insert_block(block.clone())?;

        for prescription in repos.prescriptions_for_group(group.id)? {
            let log = SessionExerciseLog {
                id: ExerciseLogId::new(),
                block_id: block.id,
                exercise_id: prescription.exercise_id.clone(),
                exercise_order: prescription.exercise_order,
                skipped: false,
                completed_at: None,
                notes: None,
            };
            repos.insert_exercise_log(log.clone())?;

            for set_number in 1..=effective_sets(&group, &prescription) {
                repos.insert_set(SessionSet {
                    id: SetId::new(),
                    exercise_log_id: log.id,
                    set_number,
                    actual_reps: prescription.quantity.reps(),
                    actual_weight_kg: prescription.target_weight_kg,
                    hold_seconds_actual: prescription.quantity.hold_seconds(),
                    rpe_value_id: prescription.rpe_value_id,
                    completed: false,
                    was_failure: false,
                })?;
            }
        }
    }
    Ok(())
}

/// Request to start a session
#[derive(Clone, Debug, Default)]
pub struct NewSession {
    /// Workout to instantiate; `None` starts an empty ad-hoc session
    pub workout_id: Option<WorkoutId>,
    pub notes: Option<String>,
}

/// Partial update of a session without ending it
#[derive(Clone, Debug, Default)]
pub struct SessionUpdate {
    pub notes: Option<Option<String>>,
    pub perceived_intensity: Option<Option<u8>>,
}

/// Session creation, reads and session-level mutations
pub struct SessionService<'a, S> {
    store: &'a S,
    access: AccessResolver<'a>,
}

impl<'a, S: Store> SessionService<'a, S> {
    pub fn new(store: &'a S, directory: &'a dyn TrainerClientDirectory) -> Self {
        Self {
            store,
            access: AccessResolver::new(directory),
        }
    }

    /// Start a session for `user`, optionally instantiated from a workout
    ///
    /// The workout must belong to the acting identity or to the performing
    /// user; a trainer can run their own template for a client.
    pub fn create_session(
        &self,
        actor: &UserId,
        user: &UserId,
        new: NewSession,
    ) -> Result<SessionDetail> {
        self.access.authorize_create(actor, user)?;

        let session = WorkoutSession {
            id: SessionId::new(),
            user_id: user.clone(),
            created_by_id: actor.clone(),
            workout_id: new.workout_id,
            started_at: Utc::now(),
            ended_at: None,
            completed: false,
            perceived_intensity: None,
            notes: new.notes,
        };

        let detail = self.store.transaction(|repos| {
            if let Some(workout_id) = session.workout_id {
                match repos.workout(workout_id)? {
                    Some(w) if &w.owner_id == actor || &w.owner_id == user => {}
                    _ => return Err(Error::not_found("workout", workout_id)),
                }
            }

            repos.insert_session(session.clone())?;
            if let Some(workout_id) = session.workout_id {
                instantiate(repos, session.id, workout_id)?;
            }
            session_detail(repos, session.clone())
        })?;

        tracing::info!(
            "Started session {} for {} (by {}): {} blocks, {} sets",
            detail.session.id,
            user,
            actor,
            detail.blocks.len(),
            detail.set_count()
        );
        Ok(detail)
    }

    pub fn session(&self, actor: &UserId, id: SessionId) -> Result<SessionDetail> {
        self.store.read(|repos| {
            let session = self.access.visible(actor, repos.session(id)?, id)?;
            session_detail(repos, session)
        })
    }

    /// Sessions performed by `user` that `actor` can see, newest first
    pub fn list_sessions(
        &self,
        actor: &UserId,
        user: &UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<WorkoutSession>> {
        self.store.read(|repos| {
            Ok(repos
                .sessions_for_user(user)?
                .into_iter()
                .filter(|s| self.access.can_access(actor, s))
                .filter(|s| since.map_or(true, |t| s.started_at >= t))
                .collect())
        })
    }

    pub fn update_session(
        &self,
        actor: &UserId,
        id: SessionId,
        update: SessionUpdate,
    ) -> Result<WorkoutSession> {
        if let Some(intensity) = update.perceived_intensity {
            validate_effort("perceived_intensity", intensity)?;
        }

        self.store.transaction(|repos| {
            let mut session = self.access.visible(actor, repos.session(id)?, id)?;
            if let Some(notes) = update.notes {
                session.notes = notes;
            }
            if let Some(intensity) = update.perceived_intensity {
                session.perceived_intensity = intensity;
            }
            repos.update_session(session.clone())?;
            Ok(session)
        })
    }

    /// Mark the session ended and completed, whatever its blocks' state
    pub fn end_session(
        &self,
        actor: &UserId,
        id: SessionId,
        notes: Option<String>,
        perceived_intensity: Option<u8>,
    ) -> Result<WorkoutSession> {
        validate_effort("perceived_intensity", perceived_intensity)?;

        let session = self.store.transaction(|repos| {
            let mut session = self.access.visible(actor, repos.session(id)?, id)?;
            session.ended_at = Some(Utc::now());
            session.completed = true;
            if perceived_intensity.is_some() {
                session.perceived_intensity = perceived_intensity;
            }
            if notes.is_some() {
                session.notes = notes;
            }
            repos.update_session(session.clone())?;
            Ok(session)
        })?;

        tracing::info!("Ended session {}", id);
        Ok(session)
    }

    /// Delete a session with its whole tracking structure
    pub fn delete_session(&self, actor: &UserId, id: SessionId) -> Result<()> {
        self.store.transaction(|repos| {
            self.access.visible(actor, repos.session(id)?, id)?;
            repos.delete_session(id)?;
            Ok(())
        })?;
        tracing::info!("Deleted session {}", id);
        Ok(())
    }
}
