//! Session state machine: block, exercise-log and set transitions.
//!
//! Completion and skipping are independent flags per record. Completing
//! clears `skipped`, skipping clears `completed_at`, and neither cascades to
//! parents or children. Every record is reached through its owning session,
//! so an actor who cannot see the session gets `NotFound` for its records.

use crate::auth::{AccessResolver, TrainerClientDirectory};
use crate::catalog::RpeCatalog;
use crate::session::{block_detail, exercise_log_detail, validate_effort};
use crate::store::{SessionRepository, Store};
use crate::types::*;
use crate::units::Weight;
use crate::{Error, Result};
use chrono::Utc;

/// Fields for an appended set
#[derive(Clone, Debug, Default)]
pub struct NewSet {
    pub actual_reps: Option<u32>,
    pub hold_seconds_actual: Option<u32>,
    pub weight: Option<Weight>,
    pub rpe_value_id: Option<RpeValueId>,
    pub completed: bool,
    pub was_failure: bool,
}

/// Partial update of a logged set
#[derive(Clone, Debug, Default)]
pub struct SetUpdate {
    pub actual_reps: Option<Option<u32>>,
    pub hold_seconds_actual: Option<Option<u32>>,
    /// Converted to kg before it is stored
    pub weight: Option<Option<Weight>>,
    pub rpe_value_id: Option<Option<RpeValueId>>,
    pub completed: Option<bool>,
    pub was_failure: Option<bool>,
}

fn block_in<R>(
    repos: &R,
    access: &AccessResolver<'_>,
    actor: &UserId,
    id: BlockId,
) -> Result<SessionBlock>
where
    R: SessionRepository + ?Sized,
{
    let block = repos
        .block(id)?
        .ok_or_else(|| Error::not_found("session block", id))?;
    access
        .visible(actor, repos.session(block.session_id)?, block.session_id)
        .map_err(|_| Error::not_found("session block", id))?;
    Ok(block)
}

fn exercise_log_in<R>(
    repos: &R,
    access: &AccessResolver<'_>,
    actor: &UserId,
    id: ExerciseLogId,
) -> Result<SessionExerciseLog>
where
    R: SessionRepository + ?Sized,
{
    let log = repos
        .exercise_log(id)?
        .ok_or_else(|| Error::not_found("exercise log", id))?;
    block_in(repos, access, actor, log.block_id).map_err(|_| Error::not_found("exercise log", id))?;
    Ok(log)
}

fn set_in<R>(
    repos: &R,
    access: &AccessResolver<'_>,
    actor: &UserId,
    id: SetId,
) -> Result<SessionSet>
where
    R: SessionRepository + ?Sized,
{
    let set = repos
        .set(id)?
        .ok_or_else(|| Error::not_found("set", id))?;
    exercise_log_in(repos, access, actor, set.exercise_log_id)
        .map_err(|_| Error::not_found("set", id))?;
    Ok(set)
}

/// A set records reps or a hold duration, never both
fn check_set_quantity(set: &SessionSet) -> Result<()> {
    if set.actual_reps.is_some() && set.hold_seconds_actual.is_some() {
        return Err(Error::Validation(
            "log either reps or hold seconds for a set, not both".into(),
        ));
    }
    Ok(())
}

fn positive(field: &str, value: Option<u32>) -> Result<()> {
    match value {
        Some(0) => Err(Error::Validation(format!("{} must be at least 1", field))),
        _ => Ok(()),
    }
}

/// Transitions on the records of an existing session
pub struct SessionTracker<'a, S> {
    store: &'a S,
    access: AccessResolver<'a>,
    rpe: &'a dyn RpeCatalog,
}

impl<'a, S: Store> SessionTracker<'a, S> {
    pub fn new(
        store: &'a S,
        directory: &'a dyn TrainerClientDirectory,
        rpe: &'a dyn RpeCatalog,
    ) -> Self {
        Self {
            store,
            access: AccessResolver::new(directory),
            rpe,
        }
    }

    fn check_rpe(&self, rpe_value_id: Option<RpeValueId>) -> Result<()> {
        match rpe_value_id {
            Some(id) if self.rpe.rpe_value(id).is_none() => {
                Err(Error::Validation(format!("unknown RPE value {}", id)))
            }
            _ => Ok(()),
        }
    }

    fn modify_block<F>(&self, actor: &UserId, id: BlockId, f: F) -> Result<SessionBlock>
    where
        F: FnOnce(&mut SessionBlock),
    {
        self.store.transaction(|repos| {
            let mut block = block_in(repos, &self.access, actor, id)?;
            f(&mut block);
            repos.update_block(block.clone())?;
            Ok(block)
        })
    }

    fn modify_exercise_log<F>(
        &self,
        actor: &UserId,
        id: ExerciseLogId,
        f: F,
    ) -> Result<SessionExerciseLog>
    where
        F: FnOnce(&mut SessionExerciseLog),
    {
        self.store.transaction(|repos| {
            let mut log = exercise_log_in(repos, &self.access, actor, id)?;
            f(&mut log);
            repos.update_exercise_log(log.clone())?;
            Ok(log)
        })
    }

    fn modify_set<F>(&self, actor: &UserId, id: SetId, f: F) -> Result<SessionSet>
    where
        F: FnOnce(&mut SessionSet),
    {
        self.store.transaction(|repos| {
            let mut set = set_in(repos, &self.access, actor, id)?;
            f(&mut set);
            check_set_quantity(&set)?;
            repos.update_set(set.clone())?;
            Ok(set)
        })
    }

    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------

    pub fn block(&self, actor: &UserId, id: BlockId) -> Result<BlockDetail> {
        self.store.read(|repos| {
            let block = block_in(repos, &self.access, actor, id)?;
            block_detail(repos, block)
        })
    }

    pub fn complete_block(&self, actor: &UserId, id: BlockId) -> Result<SessionBlock> {
        let block = self.modify_block(actor, id, |b| {
            b.completed_at = Some(Utc::now());
            b.skipped = false;
        })?;
        tracing::info!("Completed block {}", id);
        Ok(block)
    }

    pub fn skip_block(&self, actor: &UserId, id: BlockId) -> Result<SessionBlock> {
        let block = self.modify_block(actor, id, |b| {
            b.skipped = true;
            b.completed_at = None;
        })?;
        tracing::info!("Skipped block {}", id);
        Ok(block)
    }

    pub fn update_block_rpe(
        &self,
        actor: &UserId,
        id: BlockId,
        perceived_exertion: Option<u8>,
    ) -> Result<SessionBlock> {
        validate_effort("perceived_exertion", perceived_exertion)?;
        self.modify_block(actor, id, |b| b.perceived_exertion = perceived_exertion)
    }

    // ------------------------------------------------------------------------
    // Exercise logs
    // ------------------------------------------------------------------------

    pub fn exercise_log(&self, actor: &UserId, id: ExerciseLogId) -> Result<ExerciseLogDetail> {
        self.store.read(|repos| {
            let log = exercise_log_in(repos, &self.access, actor, id)?;
            exercise_log_detail(repos, log)
        })
    }

    pub fn complete_exercise_log(
        &self,
        actor: &UserId,
        id: ExerciseLogId,
    ) -> Result<SessionExerciseLog> {
        let log = self.modify_exercise_log(actor, id, |l| {
            l.completed_at = Some(Utc::now());
            l.skipped = false;
        })?;
        tracing::info!("Completed exercise log {}", id);
        Ok(log)
    }

    pub fn skip_exercise_log(&self, actor: &UserId, id: ExerciseLogId) -> Result<SessionExerciseLog> {
        let log = self.modify_exercise_log(actor, id, |l| {
            l.skipped = true;
            l.completed_at = None;
        })?;
        tracing::info!("Skipped exercise log {}", id);
        Ok(log)
    }

    pub fn update_exercise_log_notes(
        &self,
        actor: &UserId,
        id: ExerciseLogId,
        notes: Option<String>,
    ) -> Result<SessionExerciseLog> {
        self.modify_exercise_log(actor, id, |l| l.notes = notes)
    }

    /// Append a set numbered one past the highest existing `set_number`
    ///
    /// Numbers freed by deletion are never reused.
    pub fn add_set(&self, actor: &UserId, log_id: ExerciseLogId, new: NewSet) -> Result<SessionSet> {
        positive("actual_reps", new.actual_reps)?;
        positive("hold_seconds_actual", new.hold_seconds_actual)?;
        self.check_rpe(new.rpe_value_id)?;
        let actual_weight_kg = new.weight.map(|w| w.validated_kg()).transpose()?;

        let set = self.store.transaction(|repos| {
            exercise_log_in(repos, &self.access, actor, log_id)?;
            let set_number = repos
                .sets_for_exercise_log(log_id)?
                .iter()
                .map(|s| s.set_number)
                .max()
                .unwrap_or(0)
                + 1;

            let set = SessionSet {
                id: SetId::new(),
                exercise_log_id: log_id,
                set_number,
                actual_reps: new.actual_reps,
                actual_weight_kg,
                hold_seconds_actual: new.hold_seconds_actual,
                rpe_value_id: new.rpe_value_id,
                completed: new.completed,
                was_failure: new.was_failure,
            };
            check_set_quantity(&set)?;
            repos.insert_set(set.clone())?;
            Ok(set)
        })?;

        tracing::info!("Added set {} to exercise log {}", set.set_number, log_id);
        Ok(set)
    }

    // ------------------------------------------------------------------------
    // Sets
    // ------------------------------------------------------------------------

    pub fn set(&self, actor: &UserId, id: SetId) -> Result<SessionSet> {
        self.store.read(|repos| set_in(repos, &self.access, actor, id))
    }

    pub fn update_set(&self, actor: &UserId, id: SetId, update: SetUpdate) -> Result<SessionSet> {
        if let Some(reps) = update.actual_reps {
            positive("actual_reps", reps)?;
        }
        if let Some(hold) = update.hold_seconds_actual {
            positive("hold_seconds_actual", hold)?;
        }
        if let Some(rpe) = update.rpe_value_id {
            self.check_rpe(rpe)?;
        }
        let weight_kg = update
            .weight
            .map(|w| w.map(|w| w.validated_kg()).transpose())
            .transpose()?;

        self.modify_set(actor, id, |s| {
            if let Some(reps) = update.actual_reps {
                s.actual_reps = reps;
            }
            if let Some(hold) = update.hold_seconds_actual {
                s.hold_seconds_actual = hold;
            }
            if let Some(kg) = weight_kg {
                s.actual_weight_kg = kg;
            }
            if let Some(rpe) = update.rpe_value_id {
                s.rpe_value_id = rpe;
            }
            if let Some(completed) = update.completed {
                s.completed = completed;
            }
            if let Some(failure) = update.was_failure {
                s.was_failure = failure;
            }
        })
    }

    /// Mark a set completed, optionally recording the final rep count
    pub fn complete_set(&self, actor: &UserId, id: SetId, actual_reps: Option<u32>) -> Result<SessionSet> {
        positive("actual_reps", actual_reps)?;
        let set = self.modify_set(actor, id, |s| {
            s.completed = true;
            if actual_reps.is_some() {
                s.actual_reps = actual_reps;
            }
        })?;
        tracing::info!("Completed set {} ({})", set.set_number, id);
        Ok(set)
    }

    /// Hard delete; remaining sets keep their numbers
    pub fn delete_set(&self, actor: &UserId, id: SetId) -> Result<()> {
        self.store.transaction(|repos| {
            set_in(repos, &self.access, actor, id)?;
            repos.delete_set(id)?;
            Ok(())
        })?;
        tracing::info!("Deleted set {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClientRoster;
    use crate::catalog::get_default_catalog;
    use crate::prescription::{GroupDraft, PrescriptionDraft, PrescriptionEditor};
    use crate::session::{NewSession, SessionService};
    use crate::store::MemoryStore;
    use crate::units::Weight;
    use crate::workout::{NewWorkout, WorkoutService};

    struct Fixture {
        store: MemoryStore,
        roster: ClientRoster,
        detail: SessionDetail,
    }

    impl Fixture {
        fn tracker(&self) -> SessionTracker<'_, MemoryStore> {
            SessionTracker::new(&self.store, &self.roster, get_default_catalog())
        }

        fn block_id(&self) -> BlockId {
            self.detail.blocks[0].block.id
        }

        fn log_id(&self) -> ExerciseLogId {
            self.detail.blocks[0].exercises[0].log.id
        }

        fn set_ids(&self) -> Vec<SetId> {
            self.detail.blocks[0].exercises[0]
                .sets
                .iter()
                .map(|s| s.id)
                .collect()
        }
    }

    /// Leg Day (3x8 squat @ 80 kg) instantiated for ana by trainer tom
    fn fixture() -> Fixture {
        crate::logging::init_test();
        let store = MemoryStore::new();
        let tom = UserId::from("tom");
        let ana = UserId::from("ana");
        let catalog = get_default_catalog();

        let workout = WorkoutService::new(&store)
            .create_workout(
                &tom,
                NewWorkout {
                    title: "Leg Day".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        PrescriptionEditor::new(&store, catalog, catalog)
            .create_group(
                &tom,
                workout.id,
                GroupDraft::new(GroupType::Straight, 1).with_exercise(
                    PrescriptionDraft::reps("squat", 3, 8).with_weight(Weight::kg(80.0)),
                ),
            )
            .unwrap();

        let mut roster = ClientRoster::default();
        roster.invite(&tom, &ana).unwrap();
        roster.accept(&tom, &ana).unwrap();

        let detail = SessionService::new(&store, &roster)
            .create_session(
                &tom,
                &ana,
                NewSession {
                    workout_id: Some(workout.id),
                    notes: None,
                },
            )
            .unwrap();

        Fixture {
            store,
            roster,
            detail,
        }
    }

    #[test]
    fn test_complete_first_set_with_final_reps() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");
        let ids = fx.set_ids();

        let set = tracker.complete_set(&ana, ids[0], Some(10)).unwrap();
        assert!(set.completed);
        assert_eq!(set.actual_reps, Some(10));

        let log = tracker.exercise_log(&ana, fx.log_id()).unwrap();
        assert_eq!(log.sets[0].actual_reps, Some(10));
        for set in &log.sets[1..] {
            assert!(!set.completed);
            assert_eq!(set.actual_reps, Some(8));
            assert_eq!(set.actual_weight_kg, Some(80.0));
        }
    }

    #[test]
    fn test_block_skip_and_complete_clear_each_other() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");

        let skipped = tracker.skip_block(&ana, fx.block_id()).unwrap();
        assert_eq!(skipped.progress(), Progress::Skipped);

        let completed = tracker.complete_block(&ana, fx.block_id()).unwrap();
        assert_eq!(completed.progress(), Progress::Completed);
        assert!(!completed.skipped);

        let skipped = tracker.skip_block(&ana, fx.block_id()).unwrap();
        assert!(skipped.completed_at.is_none());
        assert!(skipped.skipped);
    }

    #[test]
    fn test_block_and_log_states_are_independent() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");

        tracker.complete_block(&ana, fx.block_id()).unwrap();
        tracker.skip_exercise_log(&ana, fx.log_id()).unwrap();

        let block = tracker.block(&ana, fx.block_id()).unwrap();
        assert_eq!(block.block.progress(), Progress::Completed);
        assert_eq!(block.exercises[0].log.progress(), Progress::Skipped);

        let log = tracker.complete_exercise_log(&ana, fx.log_id()).unwrap();
        assert_eq!(log.progress(), Progress::Completed);
    }

    #[test]
    fn test_block_rpe_and_log_notes() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");

        let block = tracker.update_block_rpe(&ana, fx.block_id(), Some(9)).unwrap();
        assert_eq!(block.perceived_exertion, Some(9));
        assert_eq!(block.progress(), Progress::Pending);
        assert!(tracker
            .update_block_rpe(&ana, fx.block_id(), Some(0))
            .unwrap_err()
            .is_validation());

        let log = tracker
            .update_exercise_log_notes(&ana, fx.log_id(), Some("knees caved on 3".into()))
            .unwrap();
        assert_eq!(log.notes.as_deref(), Some("knees caved on 3"));
    }

    #[test]
    fn test_set_numbering_never_reuses() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");
        let ids = fx.set_ids();

        let fourth = tracker
            .add_set(
                &ana,
                fx.log_id(),
                NewSet {
                    actual_reps: Some(6),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(fourth.set_number, 4);

        tracker.delete_set(&ana, fourth.id).unwrap();
        tracker.delete_set(&ana, ids[1]).unwrap();

        let next = tracker
            .add_set(&ana, fx.log_id(), NewSet::default())
            .unwrap();
        assert_eq!(next.set_number, 4);

        let numbers: Vec<u32> = tracker
            .exercise_log(&ana, fx.log_id())
            .unwrap()
            .sets
            .iter()
            .map(|s| s.set_number)
            .collect();
        assert_eq!(numbers, vec![1, 3, 4]);
    }

    #[test]
    fn test_delete_middle_set_then_append() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");
        let ids = fx.set_ids();
        assert_eq!(ids.len(), 3);

        tracker.delete_set(&ana, ids[1]).unwrap();
        let appended = tracker
            .add_set(&ana, fx.log_id(), NewSet::default())
            .unwrap();
        assert_eq!(appended.set_number, 4);

        let numbers: Vec<u32> = tracker
            .exercise_log(&ana, fx.log_id())
            .unwrap()
            .sets
            .iter()
            .map(|s| s.set_number)
            .collect();
        assert_eq!(numbers, vec![1, 3, 4]);
    }

    #[test]
    fn test_set_never_holds_reps_and_hold_together() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");

        let hold = tracker
            .add_set(
                &ana,
                fx.log_id(),
                NewSet {
                    hold_seconds_actual: Some(45),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(tracker
            .complete_set(&ana, hold.id, Some(10))
            .unwrap_err()
            .is_validation());
        assert!(tracker
            .update_set(
                &ana,
                hold.id,
                SetUpdate {
                    actual_reps: Some(Some(10)),
                    ..Default::default()
                },
            )
            .unwrap_err()
            .is_validation());
        assert_eq!(tracker.set(&ana, hold.id).unwrap(), hold);

        // A prescribed rep set cannot gain a hold either
        let rep_set = fx.set_ids()[0];
        assert!(tracker
            .update_set(
                &ana,
                rep_set,
                SetUpdate {
                    hold_seconds_actual: Some(Some(30)),
                    ..Default::default()
                },
            )
            .unwrap_err()
            .is_validation());

        // Switching kind in one update is allowed
        let switched = tracker
            .update_set(
                &ana,
                hold.id,
                SetUpdate {
                    actual_reps: Some(Some(10)),
                    hold_seconds_actual: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(switched.actual_reps, Some(10));
        assert_eq!(switched.hold_seconds_actual, None);

        let completed = tracker.complete_set(&ana, hold.id, None).unwrap();
        assert!(completed.completed);
    }

    #[test]
    fn test_add_set_converts_weight_and_checks_rpe() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");

        let set = tracker
            .add_set(
                &ana,
                fx.log_id(),
                NewSet {
                    actual_reps: Some(5),
                    weight: Some(Weight::lb(225.0)),
                    rpe_value_id: Some(RpeValueId(4)),
                    ..Default::default()
                },
            )
            .unwrap();
        let kg = set.actual_weight_kg.unwrap();
        assert!((kg - 102.058).abs() < 0.001);

        let err = tracker
            .add_set(
                &ana,
                fx.log_id(),
                NewSet {
                    rpe_value_id: Some(RpeValueId(42)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());

        let err = tracker
            .add_set(
                &ana,
                fx.log_id(),
                NewSet {
                    actual_reps: Some(5),
                    hold_seconds_actual: Some(30),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_set_partial_in_pounds() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");
        let id = fx.set_ids()[2];

        let set = tracker
            .update_set(
                &ana,
                id,
                SetUpdate {
                    weight: Some(Some(Weight::lb(200.0))),
                    was_failure: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!((set.actual_weight_kg.unwrap() - 90.718_474).abs() < 1e-6);
        assert!(set.was_failure);
        assert_eq!(set.actual_reps, Some(8));
        assert!(!set.completed);

        let cleared = tracker
            .update_set(
                &ana,
                id,
                SetUpdate {
                    weight: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.actual_weight_kg, None);

        assert!(tracker
            .update_set(
                &ana,
                id,
                SetUpdate {
                    weight: Some(Some(Weight::kg(-5.0))),
                    ..Default::default()
                },
            )
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_creator_keeps_access_and_strangers_get_not_found() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ids = fx.set_ids();

        // The trainer who created the session can log sets
        assert!(tracker.complete_set(&"tom".into(), ids[0], None).is_ok());

        let zoe = UserId::from("zoe");
        assert!(tracker.block(&zoe, fx.block_id()).unwrap_err().is_not_found());
        assert!(tracker
            .skip_exercise_log(&zoe, fx.log_id())
            .unwrap_err()
            .is_not_found());
        assert!(tracker.delete_set(&zoe, ids[0]).unwrap_err().is_not_found());
        assert!(tracker
            .add_set(&zoe, fx.log_id(), NewSet::default())
            .unwrap_err()
            .is_not_found());

        // Nothing changed
        assert_eq!(
            tracker.exercise_log(&"ana".into(), fx.log_id()).unwrap().sets.len(),
            3
        );
    }

    #[test]
    fn test_missing_records_are_not_found() {
        let fx = fixture();
        let tracker = fx.tracker();
        let ana = UserId::from("ana");

        assert!(tracker.complete_block(&ana, BlockId::new()).unwrap_err().is_not_found());
        assert!(tracker.set(&ana, SetId::new()).unwrap_err().is_not_found());
        assert!(tracker
            .add_set(&ana, ExerciseLogId::new(), NewSet::default())
            .unwrap_err()
            .is_not_found());
    }
}
