//! Repository interfaces and the unit-of-work abstraction.
//!
//! Services never reach a concrete store directly: they run closures against
//! `Store::read` or `Store::transaction`, and inside those closures talk only
//! to the repository traits. A transaction works on a copy of the tables that
//! is committed only when the closure returns `Ok`.

use crate::types::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Persistence for authored workouts
pub trait WorkoutRepository {
    fn insert_workout(&mut self, workout: Workout) -> Result<()>;
    fn workout(&self, id: WorkoutId) -> Result<Option<Workout>>;
    fn workouts_for_owner(&self, owner: &UserId) -> Result<Vec<Workout>>;
    fn update_workout(&mut self, workout: Workout) -> Result<()>;
    /// Removes the workout with its groups and prescriptions
    fn delete_workout(&mut self, id: WorkoutId) -> Result<bool>;
}

/// Persistence for prescription groups and their exercise prescriptions
pub trait PrescriptionRepository {
    fn insert_group(&mut self, group: PrescriptionGroup) -> Result<()>;
    fn group(&self, id: GroupId) -> Result<Option<PrescriptionGroup>>;
    /// Groups of a workout ordered by `group_order`
    fn groups_for_workout(&self, workout_id: WorkoutId) -> Result<Vec<PrescriptionGroup>>;
    fn update_group(&mut self, group: PrescriptionGroup) -> Result<()>;
    /// Removes the group with its prescriptions
    fn delete_group(&mut self, id: GroupId) -> Result<bool>;

    fn insert_prescription(&mut self, prescription: ExercisePrescription) -> Result<()>;
    /// Prescriptions of a group ordered by `exercise_order`
    fn prescriptions_for_group(&self, group_id: GroupId) -> Result<Vec<ExercisePrescription>>;
    fn delete_prescriptions_for_group(&mut self, group_id: GroupId) -> Result<usize>;
}

/// Persistence for sessions and their tracking records
pub trait SessionRepository {
    fn insert_session(&mut self, session: WorkoutSession) -> Result<()>;
    fn session(&self, id: SessionId) -> Result<Option<WorkoutSession>>;
    /// Sessions performed by a user, newest first
    fn sessions_for_user(&self, user_id: &UserId) -> Result<Vec<WorkoutSession>>;
    fn update_session(&mut self, session: WorkoutSession) -> Result<()>;
    /// Removes the session with all of its blocks, exercise logs and sets
    fn delete_session(&mut self, id: SessionId) -> Result<bool>;

    fn insert_block(&mut self, block: SessionBlock) -> Result<()>;
    fn block(&self, id: BlockId) -> Result<Option<SessionBlock>>;
    /// Blocks of a session ordered by `block_order`
    fn blocks_for_session(&self, session_id: SessionId) -> Result<Vec<SessionBlock>>;
    fn update_block(&mut self, block: SessionBlock) -> Result<()>;

    fn insert_exercise_log(&mut self, log: SessionExerciseLog) -> Result<()>;
    fn exercise_log(&self, id: ExerciseLogId) -> Result<Option<SessionExerciseLog>>;
    /// Exercise logs of a block ordered by `exercise_order`
    fn exercise_logs_for_block(&self, block_id: BlockId) -> Result<Vec<SessionExerciseLog>>;
    fn update_exercise_log(&mut self, log: SessionExerciseLog) -> Result<()>;

    fn insert_set(&mut self, set: SessionSet) -> Result<()>;
    fn set(&self, id: SetId) -> Result<Option<SessionSet>>;
    /// Sets of an exercise log ordered by `set_number`
    fn sets_for_exercise_log(&self, log_id: ExerciseLogId) -> Result<Vec<SessionSet>>;
    fn update_set(&mut self, set: SessionSet) -> Result<()>;
    fn delete_set(&mut self, id: SetId) -> Result<bool>;
}

/// Every repository a service may need inside one unit of work
pub trait Repositories: WorkoutRepository + PrescriptionRepository + SessionRepository {}

impl<T> Repositories for T where T: WorkoutRepository + PrescriptionRepository + SessionRepository {}

/// A transactional store handing out repository access
pub trait Store {
    type Repos: Repositories;

    /// Run a read-only closure against a consistent view
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self::Repos) -> Result<T>;

    /// Run a closure atomically: its writes persist only if it returns `Ok`
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self::Repos) -> Result<T>;
}

// ============================================================================
// Tables
// ============================================================================

/// The full relational state, one map per entity
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    workouts: BTreeMap<WorkoutId, Workout>,
    #[serde(default)]
    groups: BTreeMap<GroupId, PrescriptionGroup>,
    #[serde(default)]
    prescriptions: BTreeMap<PrescriptionId, ExercisePrescription>,
    #[serde(default)]
    sessions: BTreeMap<SessionId, WorkoutSession>,
    #[serde(default)]
    blocks: BTreeMap<BlockId, SessionBlock>,
    #[serde(default)]
    exercise_logs: BTreeMap<ExerciseLogId, SessionExerciseLog>,
    #[serde(default)]
    sets: BTreeMap<SetId, SessionSet>,
}

fn replace<K: Ord, V>(
    map: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    entity: &'static str,
    id: impl ToString,
) -> Result<()> {
    match map.get_mut(&key) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(Error::not_found(entity, id)),
    }
}

impl WorkoutRepository for Tables {
    fn insert_workout(&mut self, workout: Workout) -> Result<()> {
        self.workouts.insert(workout.id, workout);
        Ok(())
    }

    fn workout(&self, id: WorkoutId) -> Result<Option<Workout>> {
        Ok(self.workouts.get(&id).cloned())
    }

    fn workouts_for_owner(&self, owner: &UserId) -> Result<Vec<Workout>> {
        let mut workouts: Vec<_> = self
            .workouts
            .values()
            .filter(|w| &w.owner_id == owner)
            .cloned()
            .collect();
        workouts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(workouts)
    }

    fn update_workout(&mut self, workout: Workout) -> Result<()> {
        let id = workout.id;
        replace(&mut self.workouts, id, workout, "workout", id)
    }

    fn delete_workout(&mut self, id: WorkoutId) -> Result<bool> {
        if self.workouts.remove(&id).is_none() {
            return Ok(false);
        }
        let group_ids: Vec<GroupId> = self
            .groups
            .values()
            .filter(|g| g.workout_id == id)
            .map(|g| g.id)
            .collect();
        for group_id in group_ids {
            self.delete_group(group_id)?;
        }
        Ok(true)
    }
}

impl PrescriptionRepository for Tables {
    fn insert_group(&mut self, group: PrescriptionGroup) -> Result<()> {
        self.groups.insert(group.id, group);
        Ok(())
    }

    fn group(&self, id: GroupId) -> Result<Option<PrescriptionGroup>> {
        Ok(self.groups.get(&id).cloned())
    }

    fn groups_for_workout(&self, workout_id: WorkoutId) -> Result<Vec<PrescriptionGroup>> {
        let mut groups: Vec<_> = self
            .groups
            .values()
            .filter(|g| g.workout_id == workout_id)
            .cloned()
            .collect();
        groups.sort_by_key(|g| g.group_order);
        Ok(groups)
    }

    fn update_group(&mut self, group: PrescriptionGroup) -> Result<()> {
        let id = group.id;
        replace(&mut self.groups, id, group, "prescription group", id)
    }

    fn delete_group(&mut self, id: GroupId) -> Result<bool> {
        if self.groups.remove(&id).is_none() {
            return Ok(false);
        }
        self.delete_prescriptions_for_group(id)?;
        Ok(true)
    }

    fn insert_prescription(&mut self, prescription: ExercisePrescription) -> Result<()> {
        self.prescriptions.insert(prescription.id, prescription);
        Ok(())
    }

    fn prescriptions_for_group(&self, group_id: GroupId) -> Result<Vec<ExercisePrescription>> {
        let mut prescriptions: Vec<_> = self
            .prescriptions
            .values()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect();
        prescriptions.sort_by_key(|p| p.exercise_order);
        Ok(prescriptions)
    }

    fn delete_prescriptions_for_group(&mut self, group_id: GroupId) -> Result<usize> {
        let before = self.prescriptions.len();
        self.prescriptions.retain(|_, p| p.group_id != group_id);
        Ok(before - self.prescriptions.len())
    }
}

impl SessionRepository for Tables {
    fn insert_session(&mut self, session: WorkoutSession) -> Result<()> {
        self.sessions.insert(session.id, session);
        Ok(())
    }

    fn session(&self, id: SessionId) -> Result<Option<WorkoutSession>> {
        Ok(self.sessions.get(&id).cloned())
    }

    fn sessions_for_user(&self, user_id: &UserId) -> Result<Vec<WorkoutSession>> {
        let mut sessions: Vec<_> = self
            .sessions
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    fn update_session(&mut self, session: WorkoutSession) -> Result<()> {
        let id = session.id;
        replace(&mut self.sessions, id, session, "session", id)
    }

    fn delete_session(&mut self, id: SessionId) -> Result<bool> {
        if self.sessions.remove(&id).is_none() {
            return Ok(false);
        }
        let block_ids: Vec<BlockId> = self
            .blocks
            .values()
            .filter(|b| b.session_id == id)
            .map(|b| b.id)
            .collect();
        let log_ids: Vec<ExerciseLogId> = self
            .exercise_logs
            .values()
            .filter(|l| block_ids.contains(&l.block_id))
            .map(|l| l.id)
            .collect();

        self.sets.retain(|_, s| !log_ids.contains(&s.exercise_log_id));
        self.exercise_logs.retain(|id, _| !log_ids.contains(id));
        self.blocks.retain(|id, _| !block_ids.contains(id));
        Ok(true)
    }

    fn insert_block(&mut self, block: SessionBlock) -> Result<()> {
        self.blocks.insert(block.id, block);
        Ok(())
    }

    fn block(&self, id: BlockId) -> Result<Option<SessionBlock>> {
        Ok(self.blocks.get(&id).cloned())
    }

    fn blocks_for_session(&self, session_id: SessionId) -> Result<Vec<SessionBlock>> {
        let mut blocks: Vec<_> = self
            .blocks
            .values()
            .filter(|b| b.session_id == session_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.block_order);
        Ok(blocks)
    }

    fn update_block(&mut self, block: SessionBlock) -> Result<()> {
        let id = block.id;
        replace(&mut self.blocks, id, block, "block", id)
    }

    fn insert_exercise_log(&mut self, log: SessionExerciseLog) -> Result<()> {
        self.exercise_logs.insert(log.id, log);
        Ok(())
    }

    fn exercise_log(&self, id: ExerciseLogId) -> Result<Option<SessionExerciseLog>> {
        Ok(self.exercise_logs.get(&id).cloned())
    }

    fn exercise_logs_for_block(&self, block_id: BlockId) -> Result<Vec<SessionExerciseLog>> {
        let mut logs: Vec<_> = self
            .exercise_logs
            .values()
            .filter(|l| l.block_id == block_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.exercise_order);
        Ok(logs)
    }

    fn update_exercise_log(&mut self, log: SessionExerciseLog) -> Result<()> {
        let id = log.id;
        replace(&mut self.exercise_logs, id, log, "exercise log", id)
    }

    fn insert_set(&mut self, set: SessionSet) -> Result<()> {
        self.sets.insert(set.id, set);
        Ok(())
    }

    fn set(&self, id: SetId) -> Result<Option<SessionSet>> {
        Ok(self.sets.get(&id).cloned())
    }

    fn sets_for_exercise_log(&self, log_id: ExerciseLogId) -> Result<Vec<SessionSet>> {
        let mut sets: Vec<_> = self
            .sets
            .values()
            .filter(|s| s.exercise_log_id == log_id)
            .cloned()
            .collect();
        sets.sort_by_key(|s| s.set_number);
        Ok(sets)
    }

    fn update_set(&mut self, set: SessionSet) -> Result<()> {
        let id = set.id;
        replace(&mut self.sets, id, set, "set", id)
    }

    fn delete_set(&mut self, id: SetId) -> Result<bool> {
        Ok(self.sets.remove(&id).is_some())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store that keeps all tables in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }

    /// Copy of the committed tables
    pub fn snapshot(&self) -> Result<Tables> {
        self.read(|tables| Ok(tables.clone()))
    }
}

impl Store for MemoryStore {
    type Repos = Tables;

    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        let guard = self
            .tables
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".into()))?;
        f(&guard)
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".into()))?;

        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn workout(owner: &str) -> Workout {
        Workout {
            id: WorkoutId::new(),
            owner_id: owner.into(),
            title: "Leg Day".into(),
            description: None,
            estimated_minutes: None,
            created_at: Utc::now(),
        }
    }

    fn group(workout_id: WorkoutId, order: u32) -> PrescriptionGroup {
        PrescriptionGroup {
            id: GroupId::new(),
            workout_id,
            group_type: GroupType::Straight,
            group_order: order,
            group_rounds: None,
            rest_between_sets: None,
            group_name: None,
            group_notes: None,
        }
    }

    fn prescription(group_id: GroupId, order: u32) -> ExercisePrescription {
        ExercisePrescription {
            id: PrescriptionId::new(),
            group_id,
            exercise_id: "squat".into(),
            exercise_order: order,
            sets: Some(3),
            quantity: Quantity::Reps(5),
            target_weight_kg: Some(100.0),
            rpe_value_id: None,
        }
    }

    #[test]
    fn test_groups_sorted_by_order() {
        let mut tables = Tables::default();
        let w = workout("ana");
        let g3 = group(w.id, 30);
        let g1 = group(w.id, 1);
        let g2 = group(w.id, 7);
        tables.insert_group(g3.clone()).unwrap();
        tables.insert_group(g1.clone()).unwrap();
        tables.insert_group(g2.clone()).unwrap();
        tables.insert_group(group(WorkoutId::new(), 2)).unwrap();

        let orders: Vec<u32> = tables
            .groups_for_workout(w.id)
            .unwrap()
            .iter()
            .map(|g| g.group_order)
            .collect();
        assert_eq!(orders, vec![1, 7, 30]);
    }

    #[test]
    fn test_delete_workout_cascades() {
        let mut tables = Tables::default();
        let w = workout("ana");
        let g = group(w.id, 1);
        tables.insert_workout(w.clone()).unwrap();
        tables.insert_group(g.clone()).unwrap();
        tables.insert_prescription(prescription(g.id, 1)).unwrap();
        tables.insert_prescription(prescription(g.id, 2)).unwrap();

        assert!(tables.delete_workout(w.id).unwrap());
        assert!(tables.group(g.id).unwrap().is_none());
        assert!(tables.prescriptions_for_group(g.id).unwrap().is_empty());
        assert!(!tables.delete_workout(w.id).unwrap());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut tables = Tables::default();
        let err = tables.update_workout(workout("ana")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = MemoryStore::new();
        let w = workout("ana");
        let id = w.id;

        let result: Result<()> = store.transaction(|repos| {
            repos.insert_workout(w)?;
            Err(Error::Validation("abort".into()))
        });
        assert!(result.is_err());

        let found = store.read(|repos| repos.workout(id)).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let store = MemoryStore::new();
        let w = workout("ana");
        let id = w.id;

        store.transaction(|repos| repos.insert_workout(w)).unwrap();

        let found = store.read(|repos| repos.workout(id)).unwrap();
        assert_eq!(found.map(|w| w.title), Some("Leg Day".to_string()));
    }

    #[test]
    fn test_tables_json_roundtrip() {
        let mut tables = Tables::default();
        let w = workout("ana");
        let g = group(w.id, 1);
        tables.insert_workout(w.clone()).unwrap();
        tables.insert_group(g.clone()).unwrap();
        tables.insert_prescription(prescription(g.id, 1)).unwrap();

        let json = serde_json::to_string(&tables).unwrap();
        let parsed: Tables = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.workout(w.id).unwrap(), Some(w));
        assert_eq!(parsed.prescriptions_for_group(g.id).unwrap().len(), 1);
    }
}
