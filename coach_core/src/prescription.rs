//! Prescription editor: validates and persists prescription groups.
//!
//! Every entry must carry exactly one of `reps` or `hold_seconds`, reference
//! an exercise the catalog knows, and keep `exercise_order` unique inside its
//! group. Group orders are unique inside a workout. Reorders are applied as a
//! whole or not at all.

use crate::catalog::{ExerciseCatalog, RpeCatalog};
use crate::store::{PrescriptionRepository, Store};
use crate::types::*;
use crate::units::Weight;
use crate::workout::{group_detail, owned_workout};
use crate::{Error, Result};
use std::collections::HashSet;

/// An exercise prescription as submitted by an author
#[derive(Clone, Debug, PartialEq)]
pub struct PrescriptionDraft {
    pub exercise_id: ExerciseId,
    /// Position inside the group; assigned after the last entry when absent
    pub exercise_order: Option<u32>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub hold_seconds: Option<u32>,
    pub target_weight: Option<Weight>,
    pub rpe_value_id: Option<RpeValueId>,
}

impl PrescriptionDraft {
    /// Draft with a rep target and nothing else set
    pub fn reps(exercise_id: impl Into<ExerciseId>, sets: u32, reps: u32) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            exercise_order: None,
            sets: Some(sets),
            reps: Some(reps),
            hold_seconds: None,
            target_weight: None,
            rpe_value_id: None,
        }
    }

    /// Draft with a timed hold target and nothing else set
    pub fn hold(exercise_id: impl Into<ExerciseId>, sets: u32, seconds: u32) -> Self {
        Self {
            hold_seconds: Some(seconds),
            reps: None,
            ..Self::reps(exercise_id, sets, 0)
        }
    }

    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.target_weight = Some(weight);
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.exercise_order = Some(order);
        self
    }
}

/// A prescription group as submitted by an author
#[derive(Clone, Debug, PartialEq)]
pub struct GroupDraft {
    pub group_type: GroupType,
    pub group_order: u32,
    pub group_rounds: Option<u32>,
    pub rest_between_sets: Option<u32>,
    pub group_name: Option<String>,
    pub group_notes: Option<String>,
    pub exercises: Vec<PrescriptionDraft>,
}

impl GroupDraft {
    pub fn new(group_type: GroupType, group_order: u32) -> Self {
        Self {
            group_type,
            group_order,
            group_rounds: None,
            rest_between_sets: None,
            group_name: None,
            group_notes: None,
            exercises: Vec::new(),
        }
    }

    pub fn with_exercise(mut self, draft: PrescriptionDraft) -> Self {
        self.exercises.push(draft);
        self
    }
}

/// Partial update of a group; `exercises` replaces the full entry set
#[derive(Clone, Debug, Default)]
pub struct GroupUpdate {
    pub group_type: Option<GroupType>,
    pub group_order: Option<u32>,
    pub group_rounds: Option<Option<u32>>,
    pub rest_between_sets: Option<Option<u32>>,
    pub group_name: Option<Option<String>>,
    pub group_notes: Option<Option<String>>,
    pub exercises: Option<Vec<PrescriptionDraft>>,
}

/// Number of sets a prescription expands to when a session is instantiated
///
/// Explicit `sets` win; superset and circuit groups otherwise repeat for their
/// rounds; drop-set tiers are always a single set.
pub fn effective_sets(group: &PrescriptionGroup, prescription: &ExercisePrescription) -> u32 {
    if group.group_type == GroupType::DropSet {
        return 1;
    }
    let count = match (prescription.sets, group.group_rounds) {
        (Some(sets), _) => sets,
        (None, Some(rounds)) if group.group_type.repeats_in_rounds() => rounds,
        _ => 1,
    };
    count.max(1)
}

/// Enforce the reps XOR hold-duration invariant
pub fn validate_quantity(reps: Option<u32>, hold_seconds: Option<u32>) -> Result<Quantity> {
    match (reps, hold_seconds) {
        (Some(_), Some(_)) => Err(Error::Validation(
            "set either reps or hold_seconds, not both".into(),
        )),
        (None, None) => Err(Error::Validation(
            "one of reps or hold_seconds is required".into(),
        )),
        (Some(0), None) => Err(Error::Validation("reps must be at least 1".into())),
        (None, Some(0)) => Err(Error::Validation("hold_seconds must be at least 1".into())),
        (Some(reps), None) => Ok(Quantity::Reps(reps)),
        (None, Some(seconds)) => Ok(Quantity::HoldSeconds(seconds)),
    }
}

fn validate_positive(field: &str, value: Option<u32>) -> Result<()> {
    match value {
        Some(0) => Err(Error::Validation(format!("{} must be at least 1", field))),
        _ => Ok(()),
    }
}

/// Drop-set tiers are single sets; any other type accepts an explicit count
fn check_sets_for_type(group_type: GroupType, sets: Option<u32>) -> Result<()> {
    if group_type == GroupType::DropSet && sets.is_some_and(|s| s > 1) {
        return Err(Error::Validation(
            "drop set tiers are single sets; add one entry per tier".into(),
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Prescription group editing against a store and the read-only catalogs
pub struct PrescriptionEditor<'a, S> {
    store: &'a S,
    exercises: &'a dyn ExerciseCatalog,
    rpe: &'a dyn RpeCatalog,
}

impl<'a, S: Store> PrescriptionEditor<'a, S> {
    pub fn new(store: &'a S, exercises: &'a dyn ExerciseCatalog, rpe: &'a dyn RpeCatalog) -> Self {
        Self {
            store,
            exercises,
            rpe,
        }
    }

    /// Validate one draft into a persistable prescription
    fn build_prescription(
        &self,
        group: &PrescriptionGroup,
        draft: &PrescriptionDraft,
        exercise_order: u32,
    ) -> Result<ExercisePrescription> {
        if self.exercises.exercise(&draft.exercise_id).is_none() {
            return Err(Error::Validation(format!(
                "unknown exercise '{}'",
                draft.exercise_id
            )));
        }

        let quantity = validate_quantity(draft.reps, draft.hold_seconds)?;
        validate_positive("sets", draft.sets)?;

        check_sets_for_type(group.group_type, draft.sets)?;

        let target_weight_kg = draft
            .target_weight
            .map(|w| w.validated_kg())
            .transpose()?;

        if let Some(rpe_id) = draft.rpe_value_id {
            if self.rpe.rpe_value(rpe_id).is_none() {
                return Err(Error::Validation(format!("unknown RPE value {}", rpe_id)));
            }
        }

        Ok(ExercisePrescription {
            id: PrescriptionId::new(),
            group_id: group.id,
            exercise_id: draft.exercise_id.clone(),
            exercise_order,
            sets: draft.sets,
            quantity,
            target_weight_kg,
            rpe_value_id: draft.rpe_value_id,
        })
    }

    /// Validate a full entry set, assigning orders to drafts without one
    fn build_entries(
        &self,
        group: &PrescriptionGroup,
        drafts: &[PrescriptionDraft],
    ) -> Result<Vec<ExercisePrescription>> {
        let mut seen = HashSet::new();
        let mut next_order = drafts
            .iter()
            .filter_map(|d| d.exercise_order)
            .max()
            .unwrap_or(0);

        drafts
            .iter()
            .map(|draft| {
                let order = match draft.exercise_order {
                    Some(order) => order,
                    None => {
                        next_order += 1;
                        next_order
                    }
                };
                if !seen.insert(order) {
                    return Err(Error::Validation(format!(
                        "duplicate exercise_order {} in group",
                        order
                    )));
                }
                self.build_prescription(group, draft, order)
            })
            .collect()
    }

    fn ensure_order_free<R>(
        repos: &R,
        workout_id: WorkoutId,
        order: u32,
        except: Option<GroupId>,
    ) -> Result<()>
    where
        R: PrescriptionRepository + ?Sized,
    {
        let taken = repos
            .groups_for_workout(workout_id)?
            .iter()
            .any(|g| g.group_order == order && Some(g.id) != except);
        if taken {
            return Err(Error::Validation(format!(
                "group_order {} is already used in workout {}",
                order, workout_id
            )));
        }
        Ok(())
    }

    pub fn create_group(
        &self,
        actor: &UserId,
        workout_id: WorkoutId,
        draft: GroupDraft,
    ) -> Result<GroupDetail> {
        validate_positive("group_rounds", draft.group_rounds)?;

        let detail = self.store.transaction(|repos| {
            owned_workout(repos, actor, workout_id)?;
            Self::ensure_order_free(repos, workout_id, draft.group_order, None)?;

            let group = PrescriptionGroup {
                id: GroupId::new(),
                workout_id,
                group_type: draft.group_type,
                group_order: draft.group_order,
                group_rounds: draft.group_rounds,
                rest_between_sets: draft.rest_between_sets,
                group_name: non_blank(draft.group_name.clone()),
                group_notes: non_blank(draft.group_notes.clone()),
            };
            let entries = self.build_entries(&group, &draft.exercises)?;

            repos.insert_group(group.clone())?;
            for entry in &entries {
                repos.insert_prescription(entry.clone())?;
            }
            Ok(GroupDetail {
                group,
                exercises: entries,
            })
        })?;

        tracing::info!(
            "Created {} group {} (order {}) with {} exercises",
            detail.group.group_type,
            detail.group.id,
            detail.group.group_order,
            detail.exercises.len()
        );
        Ok(detail)
    }

    /// Load a group whose workout the actor owns
    fn owned_group<R>(repos: &R, actor: &UserId, group_id: GroupId) -> Result<PrescriptionGroup>
    where
        R: PrescriptionRepository + crate::store::WorkoutRepository + ?Sized,
    {
        let group = repos
            .group(group_id)?
            .ok_or_else(|| Error::not_found("prescription group", group_id))?;
        owned_workout(repos, actor, group.workout_id)
            .map_err(|_| Error::not_found("prescription group", group_id))?;
        Ok(group)
    }

    pub fn group(&self, actor: &UserId, group_id: GroupId) -> Result<GroupDetail> {
        self.store.read(|repos| {
            let group = Self::owned_group(repos, actor, group_id)?;
            group_detail(repos, group)
        })
    }

    pub fn groups(&self, actor: &UserId, workout_id: WorkoutId) -> Result<Vec<GroupDetail>> {
        self.store.read(|repos| {
            owned_workout(repos, actor, workout_id)?;
            repos
                .groups_for_workout(workout_id)?
                .into_iter()
                .map(|g| group_detail(repos, g))
                .collect()
        })
    }

    pub fn update_group(
        &self,
        actor: &UserId,
        group_id: GroupId,
        update: GroupUpdate,
    ) -> Result<GroupDetail> {
        self.store.transaction(|repos| {
            let mut group = Self::owned_group(repos, actor, group_id)?;

            if let Some(group_type) = update.group_type {
                group.group_type = group_type;
            }
            if let Some(order) = update.group_order {
                Self::ensure_order_free(repos, group.workout_id, order, Some(group.id))?;
                group.group_order = order;
            }
            if let Some(rounds) = update.group_rounds {
                validate_positive("group_rounds", rounds)?;
                group.group_rounds = rounds;
            }
            if let Some(rest) = update.rest_between_sets {
                group.rest_between_sets = rest;
            }
            if let Some(name) = update.group_name.clone() {
                group.group_name = non_blank(name);
            }
            if let Some(notes) = update.group_notes.clone() {
                group.group_notes = non_blank(notes);
            }

            match &update.exercises {
                Some(drafts) => {
                    let entries = self.build_entries(&group, drafts)?;
                    repos.delete_prescriptions_for_group(group.id)?;
                    for entry in entries {
                        repos.insert_prescription(entry)?;
                    }
                }
                // Kept entries must still fit a changed type
                None if update.group_type.is_some() => {
                    for entry in repos.prescriptions_for_group(group.id)? {
                        check_sets_for_type(group.group_type, entry.sets)?;
                    }
                }
                None => {}
            }

            repos.update_group(group.clone())?;
            group_detail(repos, group)
        })
    }

    /// Delete a group of `workout_id` together with its entries
    pub fn delete_group(&self, actor: &UserId, workout_id: WorkoutId, group_id: GroupId) -> Result<()> {
        self.store.transaction(|repos| {
            owned_workout(repos, actor, workout_id)?;
            match repos.group(group_id)? {
                Some(group) if group.workout_id == workout_id => {
                    repos.delete_group(group_id)?;
                    Ok(())
                }
                _ => Err(Error::not_found("prescription group", group_id)),
            }
        })?;
        tracing::info!("Deleted group {} from workout {}", group_id, workout_id);
        Ok(())
    }

    /// Apply a complete permutation of group orders atomically
    ///
    /// The batch must name every group of the workout exactly once with
    /// distinct orders; otherwise nothing changes.
    pub fn reorder_groups(
        &self,
        actor: &UserId,
        workout_id: WorkoutId,
        orders: &[(GroupId, u32)],
    ) -> Result<Vec<PrescriptionGroup>> {
        let result = self.store.transaction(|repos| {
            owned_workout(repos, actor, workout_id)?;
            let groups = repos.groups_for_workout(workout_id)?;
            let known: HashSet<GroupId> = groups.iter().map(|g| g.id).collect();

            let mut seen_ids = HashSet::new();
            let mut seen_orders = HashSet::new();
            for (id, order) in orders {
                if !known.contains(id) {
                    return Err(Error::Validation(format!(
                        "group {} does not belong to workout {}",
                        id, workout_id
                    )));
                }
                if !seen_ids.insert(*id) {
                    return Err(Error::Validation(format!("group {} listed twice", id)));
                }
                if !seen_orders.insert(*order) {
                    return Err(Error::Validation(format!("order {} assigned twice", order)));
                }
            }
            if seen_ids.len() != known.len() {
                return Err(Error::Validation(format!(
                    "reorder must list all {} groups of the workout, got {}",
                    known.len(),
                    seen_ids.len()
                )));
            }

            for mut group in groups {
                if let Some((_, order)) = orders.iter().find(|(id, _)| *id == group.id) {
                    group.group_order = *order;
                    repos.update_group(group)?;
                }
            }
            repos.groups_for_workout(workout_id)
        });

        match &result {
            Ok(groups) => tracing::info!("Reordered {} groups of workout {}", groups.len(), workout_id),
            Err(e) => tracing::warn!("Rejected reorder of workout {}: {}", workout_id, e),
        }
        result
    }

    /// Append one entry after the current last `exercise_order` of a group
    ///
    /// Any `exercise_order` on the draft is ignored.
    pub fn append_exercise(
        &self,
        actor: &UserId,
        group_id: GroupId,
        draft: PrescriptionDraft,
    ) -> Result<ExercisePrescription> {
        let prescription = self.store.transaction(|repos| {
            let group = Self::owned_group(repos, actor, group_id)?;
            let next_order = repos
                .prescriptions_for_group(group_id)?
                .iter()
                .map(|p| p.exercise_order)
                .max()
                .unwrap_or(0)
                + 1;

            let prescription = self.build_prescription(&group, &draft, next_order)?;
            repos.insert_prescription(prescription.clone())?;
            Ok(prescription)
        })?;

        tracing::info!(
            "Appended {} to group {} at order {}",
            prescription.exercise_id,
            group_id,
            prescription.exercise_order
        );
        Ok(prescription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::store::MemoryStore;
    use crate::workout::{NewWorkout, WorkoutService};

    fn setup() -> (MemoryStore, UserId, WorkoutId) {
        let store = MemoryStore::new();
        let owner = UserId::from("ana");
        let workout = WorkoutService::new(&store)
            .create_workout(
                &owner,
                NewWorkout {
                    title: "Leg Day".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        (store, owner, workout.id)
    }

    fn editor(store: &MemoryStore) -> PrescriptionEditor<'_, MemoryStore> {
        let catalog = get_default_catalog();
        PrescriptionEditor::new(store, catalog, catalog)
    }

    fn straight(order: u32) -> GroupDraft {
        GroupDraft::new(GroupType::Straight, order)
            .with_exercise(PrescriptionDraft::reps("squat", 3, 8).with_weight(Weight::kg(80.0)))
    }

    #[test]
    fn test_quantity_xor() {
        assert_eq!(validate_quantity(Some(8), None).unwrap(), Quantity::Reps(8));
        assert_eq!(
            validate_quantity(None, Some(30)).unwrap(),
            Quantity::HoldSeconds(30)
        );
        assert!(validate_quantity(Some(8), Some(30)).unwrap_err().is_validation());
        assert!(validate_quantity(None, None).unwrap_err().is_validation());
        assert!(validate_quantity(Some(0), None).is_err());
    }

    #[test]
    fn test_create_rejects_both_reps_and_hold() {
        let (store, owner, workout_id) = setup();
        let mut draft = PrescriptionDraft::reps("plank", 3, 10);
        draft.hold_seconds = Some(30);

        let err = editor(&store)
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Straight, 1).with_exercise(draft),
            )
            .unwrap_err();
        assert!(err.is_validation());

        let groups = store.read(|r| r.groups_for_workout(workout_id)).unwrap();
        assert!(groups.is_empty(), "nothing persisted on validation failure");
    }

    #[test]
    fn test_create_rejects_neither_reps_nor_hold() {
        let (store, owner, workout_id) = setup();
        let mut draft = PrescriptionDraft::reps("plank", 3, 10);
        draft.reps = None;

        let err = editor(&store)
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Straight, 1).with_exercise(draft),
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_create_hold_prescription() {
        let (store, owner, workout_id) = setup();
        let detail = editor(&store)
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Straight, 1)
                    .with_exercise(PrescriptionDraft::hold("plank", 3, 45)),
            )
            .unwrap();

        assert_eq!(detail.exercises[0].quantity, Quantity::HoldSeconds(45));
        assert_eq!(detail.exercises[0].exercise_order, 1);
    }

    #[test]
    fn test_create_converts_target_weight_to_kg() {
        let (store, owner, workout_id) = setup();
        let detail = editor(&store)
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Straight, 1)
                    .with_exercise(PrescriptionDraft::reps("deadlift", 1, 5).with_weight(Weight::lb(315.0))),
            )
            .unwrap();

        let kg = detail.exercises[0].target_weight_kg.unwrap();
        assert!((kg - 142.88).abs() < 0.01);
    }

    #[test]
    fn test_create_rejects_unknown_exercise_and_rpe() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);

        let err = ed
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Straight, 1)
                    .with_exercise(PrescriptionDraft::reps("moon_press", 3, 8)),
            )
            .unwrap_err();
        assert!(err.is_validation());

        let mut draft = PrescriptionDraft::reps("squat", 3, 8);
        draft.rpe_value_id = Some(RpeValueId(99));
        let err = ed
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Straight, 1).with_exercise(draft),
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_duplicate_group_order_rejected() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        ed.create_group(&owner, workout_id, straight(1)).unwrap();

        let err = ed.create_group(&owner, workout_id, straight(1)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_entry_orders_assigned_and_unique() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);

        let detail = ed
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Superset, 1)
                    .with_exercise(PrescriptionDraft::reps("bench_press", 3, 8))
                    .with_exercise(PrescriptionDraft::reps("barbell_row", 3, 8)),
            )
            .unwrap();
        let orders: Vec<u32> = detail.exercises.iter().map(|e| e.exercise_order).collect();
        assert_eq!(orders, vec![1, 2]);

        let err = ed
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Superset, 2)
                    .with_exercise(PrescriptionDraft::reps("bench_press", 3, 8).with_order(1))
                    .with_exercise(PrescriptionDraft::reps("barbell_row", 3, 8).with_order(1)),
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_drop_set_tiers_are_single_sets() {
        let (store, owner, workout_id) = setup();
        let err = editor(&store)
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::DropSet, 1)
                    .with_exercise(PrescriptionDraft::reps("bench_press", 3, 8)),
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_group_on_foreign_workout_is_not_found() {
        let (store, _owner, workout_id) = setup();
        let err = editor(&store)
            .create_group(&"zoe".into(), workout_id, straight(1))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_group_partial_fields() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        let created = ed.create_group(&owner, workout_id, straight(1)).unwrap();

        let updated = ed
            .update_group(
                &owner,
                created.group.id,
                GroupUpdate {
                    group_type: Some(GroupType::Pyramid),
                    rest_between_sets: Some(Some(120)),
                    group_name: Some(Some("  Main lift ".into())),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.group.group_type, GroupType::Pyramid);
        assert_eq!(updated.group.rest_between_sets, Some(120));
        assert_eq!(updated.group.group_name.as_deref(), Some("Main lift"));
        assert_eq!(updated.exercises, created.exercises);
    }

    #[test]
    fn test_update_group_replaces_entries_atomically() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        let created = ed.create_group(&owner, workout_id, straight(1)).unwrap();

        let mut bad = PrescriptionDraft::reps("lunge", 3, 10);
        bad.hold_seconds = Some(20);
        let err = ed
            .update_group(
                &owner,
                created.group.id,
                GroupUpdate {
                    group_type: Some(GroupType::Circuit),
                    exercises: Some(vec![PrescriptionDraft::reps("squat", 2, 5), bad]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ed.group(&owner, created.group.id).unwrap(), created);

        let updated = ed
            .update_group(
                &owner,
                created.group.id,
                GroupUpdate {
                    exercises: Some(vec![
                        PrescriptionDraft::reps("squat", 2, 5),
                        PrescriptionDraft::hold("plank", 2, 30),
                    ]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.exercises.len(), 2);
        assert_eq!(updated.exercises[1].exercise_id, ExerciseId::from("plank"));
    }

    #[test]
    fn test_type_change_rechecks_kept_entries() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        let created = ed
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Straight, 1)
                    .with_exercise(PrescriptionDraft::reps("bench_press", 3, 8)),
            )
            .unwrap();

        let err = ed
            .update_group(
                &owner,
                created.group.id,
                GroupUpdate {
                    group_type: Some(GroupType::DropSet),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ed.group(&owner, created.group.id).unwrap(), created);

        // Replacing the entries in the same update makes the change valid
        let updated = ed
            .update_group(
                &owner,
                created.group.id,
                GroupUpdate {
                    group_type: Some(GroupType::DropSet),
                    exercises: Some(vec![
                        PrescriptionDraft::reps("bench_press", 1, 8),
                        PrescriptionDraft::reps("bench_press", 1, 12),
                    ]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.group.group_type, GroupType::DropSet);
        assert!(updated.exercises.iter().all(|e| e.sets == Some(1)));

        let pyramid = ed
            .update_group(
                &owner,
                created.group.id,
                GroupUpdate {
                    group_type: Some(GroupType::Pyramid),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(pyramid.exercises.len(), 2);
    }

    #[test]
    fn test_delete_group_must_belong_to_workout() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        let created = ed.create_group(&owner, workout_id, straight(1)).unwrap();

        let other = WorkoutService::new(&store)
            .create_workout(
                &owner,
                NewWorkout {
                    title: "Push Day".into(),
                    ..Default::default()
                },
            )
            .unwrap();

        let err = ed
            .delete_group(&owner, other.id, created.group.id)
            .unwrap_err();
        assert!(err.is_not_found());

        ed.delete_group(&owner, workout_id, created.group.id).unwrap();
        let remaining = store
            .read(|r| r.prescriptions_for_group(created.group.id))
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_reorder_applies_permutation() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        let a = ed.create_group(&owner, workout_id, straight(1)).unwrap().group.id;
        let b = ed.create_group(&owner, workout_id, straight(2)).unwrap().group.id;
        let c = ed.create_group(&owner, workout_id, straight(3)).unwrap().group.id;

        let groups = ed
            .reorder_groups(&owner, workout_id, &[(a, 3), (b, 1), (c, 2)])
            .unwrap();
        let ids: Vec<GroupId> = groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![b, c, a]);
    }

    #[test]
    fn test_reorder_with_unknown_group_changes_nothing() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        let a = ed.create_group(&owner, workout_id, straight(1)).unwrap().group.id;
        let b = ed.create_group(&owner, workout_id, straight(2)).unwrap().group.id;

        let err = ed
            .reorder_groups(&owner, workout_id, &[(b, 1), (a, 2), (GroupId::new(), 99999)])
            .unwrap_err();
        assert!(err.is_validation());

        let groups = ed.groups(&owner, workout_id).unwrap();
        assert_eq!(groups[0].group.id, a);
        assert_eq!(groups[0].group.group_order, 1);
        assert_eq!(groups[1].group.id, b);
        assert_eq!(groups[1].group.group_order, 2);
    }

    #[test]
    fn test_reorder_rejects_incomplete_or_duplicate_batches() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        let a = ed.create_group(&owner, workout_id, straight(1)).unwrap().group.id;
        let b = ed.create_group(&owner, workout_id, straight(2)).unwrap().group.id;

        assert!(ed.reorder_groups(&owner, workout_id, &[(a, 2)]).is_err());
        assert!(ed
            .reorder_groups(&owner, workout_id, &[(a, 5), (b, 5)])
            .is_err());
        assert!(ed
            .reorder_groups(&owner, workout_id, &[(a, 1), (a, 2)])
            .is_err());
    }

    #[test]
    fn test_append_assigns_next_order() {
        let (store, owner, workout_id) = setup();
        let ed = editor(&store);
        let group = ed
            .create_group(
                &owner,
                workout_id,
                GroupDraft::new(GroupType::Circuit, 1)
                    .with_exercise(PrescriptionDraft::reps("kb_swing", 1, 15).with_order(4)),
            )
            .unwrap();

        let appended = ed
            .append_exercise(
                &owner,
                group.group.id,
                PrescriptionDraft::reps("pushup", 1, 12).with_order(1),
            )
            .unwrap();
        assert_eq!(appended.exercise_order, 5);

        let detail = ed.group(&owner, group.group.id).unwrap();
        assert_eq!(detail.exercises.len(), 2);
    }

    #[test]
    fn test_effective_sets() {
        let group = |group_type, rounds| PrescriptionGroup {
            id: GroupId::new(),
            workout_id: WorkoutId::new(),
            group_type,
            group_order: 1,
            group_rounds: rounds,
            rest_between_sets: None,
            group_name: None,
            group_notes: None,
        };
        let entry = |sets| ExercisePrescription {
            id: PrescriptionId::new(),
            group_id: GroupId::new(),
            exercise_id: "squat".into(),
            exercise_order: 1,
            sets,
            quantity: Quantity::Reps(5),
            target_weight_kg: None,
            rpe_value_id: None,
        };

        assert_eq!(effective_sets(&group(GroupType::Straight, None), &entry(Some(4))), 4);
        assert_eq!(effective_sets(&group(GroupType::Straight, Some(3)), &entry(None)), 1);
        assert_eq!(effective_sets(&group(GroupType::Circuit, Some(3)), &entry(None)), 3);
        assert_eq!(effective_sets(&group(GroupType::Superset, Some(2)), &entry(Some(5))), 5);
        assert_eq!(effective_sets(&group(GroupType::DropSet, None), &entry(Some(3))), 1);
        assert_eq!(effective_sets(&group(GroupType::Amrap, None), &entry(None)), 1);
    }
}
