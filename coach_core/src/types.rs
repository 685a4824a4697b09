//! Core domain types for the coaching backend.
//!
//! This module defines the fundamental types used throughout the system:
//! - Identities and typed entity IDs
//! - The authored prescription (workouts, groups, exercise prescriptions)
//! - The instantiated performance record (sessions, blocks, exercise logs, sets)
//! - Nested read models returned by the services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identities
// ============================================================================

/// Identity of a user as issued by the external credential system
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Key into the exercise catalog (e.g. `squat`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(String);

impl ExerciseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExerciseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Key into the RPE-scale catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpeValueId(pub u32);

impl fmt::Display for RpeValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Identifier of an authored workout
    WorkoutId
);
entity_id!(
    /// Identifier of a prescription group inside a workout
    GroupId
);
entity_id!(
    /// Identifier of a single exercise prescription
    PrescriptionId
);
entity_id!(
    /// Identifier of a performed session
    SessionId
);
entity_id!(
    /// Identifier of a session block
    BlockId
);
entity_id!(
    /// Identifier of a session exercise log
    ExerciseLogId
);
entity_id!(
    /// Identifier of a logged set
    SetId
);

// ============================================================================
// Prescription Types
// ============================================================================

/// Programming pattern of a prescription group
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    Straight,
    Superset,
    Circuit,
    DropSet,
    Pyramid,
    Amrap,
}

impl GroupType {
    pub const ALL: [GroupType; 6] = [
        GroupType::Straight,
        GroupType::Superset,
        GroupType::Circuit,
        GroupType::DropSet,
        GroupType::Pyramid,
        GroupType::Amrap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Straight => "straight",
            GroupType::Superset => "superset",
            GroupType::Circuit => "circuit",
            GroupType::DropSet => "drop_set",
            GroupType::Pyramid => "pyramid",
            GroupType::Amrap => "amrap",
        }
    }

    /// Whether the whole group repeats for `group_rounds`
    pub fn repeats_in_rounds(&self) -> bool {
        matches!(self, GroupType::Superset | GroupType::Circuit)
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        GroupType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                crate::Error::Validation(format!(
                    "unknown group type '{}' (expected one of straight, superset, circuit, drop_set, pyramid, amrap)",
                    s
                ))
            })
    }
}

/// The quantity an exercise is prescribed in: repetitions or a timed hold
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Reps(u32),
    HoldSeconds(u32),
}

impl Quantity {
    pub fn reps(&self) -> Option<u32> {
        match self {
            Quantity::Reps(reps) => Some(*reps),
            Quantity::HoldSeconds(_) => None,
        }
    }

    pub fn hold_seconds(&self) -> Option<u32> {
        match self {
            Quantity::Reps(_) => None,
            Quantity::HoldSeconds(seconds) => Some(*seconds),
        }
    }
}

/// An authored workout, the owner of prescription groups
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: WorkoutId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub estimated_minutes: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// One programmed unit inside a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionGroup {
    pub id: GroupId,
    pub workout_id: WorkoutId,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    pub group_order: u32,
    pub group_rounds: Option<u32>,
    pub rest_between_sets: Option<u32>,
    pub group_name: Option<String>,
    pub group_notes: Option<String>,
}

/// One exercise's target inside a group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExercisePrescription {
    pub id: PrescriptionId,
    pub group_id: GroupId,
    pub exercise_id: ExerciseId,
    pub exercise_order: u32,
    pub sets: Option<u32>,
    #[serde(flatten)]
    pub quantity: Quantity,
    pub target_weight_kg: Option<f64>,
    pub rpe_value_id: Option<RpeValueId>,
}

// ============================================================================
// Session Types
// ============================================================================

/// Derived progress of a block or exercise log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Pending,
    Completed,
    Skipped,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Pending => f.write_str("pending"),
            Progress::Completed => f.write_str("completed"),
            Progress::Skipped => f.write_str("skipped"),
        }
    }
}

fn progress_of(completed_at: Option<DateTime<Utc>>, skipped: bool) -> Progress {
    match (completed_at, skipped) {
        (Some(_), _) => Progress::Completed,
        (None, true) => Progress::Skipped,
        (None, false) => Progress::Pending,
    }
}

/// One performance instance of a workout (or an ad-hoc session)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_by_id: UserId,
    pub workout_id: Option<WorkoutId>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub perceived_intensity: Option<u8>,
    pub notes: Option<String>,
}

impl WorkoutSession {
    /// Whether the session was logged on the athlete's behalf
    pub fn is_trainer_logged(&self) -> bool {
        self.user_id != self.created_by_id
    }
}

/// Tracking record instantiated from a prescription group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionBlock {
    pub id: BlockId,
    pub session_id: SessionId,
    pub block_order: u32,
    pub completed_at: Option<DateTime<Utc>>,
    pub skipped: bool,
    pub perceived_exertion: Option<u8>,
}

impl SessionBlock {
    pub fn progress(&self) -> Progress {
        progress_of(self.completed_at, self.skipped)
    }
}

/// Tracking record instantiated from an exercise prescription
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionExerciseLog {
    pub id: ExerciseLogId,
    pub block_id: BlockId,
    pub exercise_id: ExerciseId,
    pub exercise_order: u32,
    pub skipped: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl SessionExerciseLog {
    pub fn progress(&self) -> Progress {
        progress_of(self.completed_at, self.skipped)
    }
}

/// One logged set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSet {
    pub id: SetId,
    pub exercise_log_id: ExerciseLogId,
    pub set_number: u32,
    pub actual_reps: Option<u32>,
    pub actual_weight_kg: Option<f64>,
    pub hold_seconds_actual: Option<u32>,
    pub rpe_value_id: Option<RpeValueId>,
    pub completed: bool,
    pub was_failure: bool,
}

// ============================================================================
// Read Models
// ============================================================================

/// A prescription group with its entries in `exercise_order`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GroupDetail {
    pub group: PrescriptionGroup,
    pub exercises: Vec<ExercisePrescription>,
}

/// A workout with its groups in `group_order`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WorkoutDetail {
    pub workout: Workout,
    pub groups: Vec<GroupDetail>,
}

/// An exercise log with its sets in `set_number` order
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExerciseLogDetail {
    pub log: SessionExerciseLog,
    pub sets: Vec<SessionSet>,
}

/// A block with its exercise logs in `exercise_order`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BlockDetail {
    pub block: SessionBlock,
    pub exercises: Vec<ExerciseLogDetail>,
}

/// A session with its full tracking structure
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SessionDetail {
    pub session: WorkoutSession,
    pub blocks: Vec<BlockDetail>,
}

impl SessionDetail {
    pub fn set_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| &b.exercises)
            .map(|e| e.sets.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_type_parse() {
        assert_eq!("straight".parse::<GroupType>().unwrap(), GroupType::Straight);
        assert_eq!("drop-set".parse::<GroupType>().unwrap(), GroupType::DropSet);
        assert_eq!("AMRAP".parse::<GroupType>().unwrap(), GroupType::Amrap);
        assert!("giant_set".parse::<GroupType>().unwrap_err().is_validation());
    }

    #[test]
    fn test_group_type_serde_tag() {
        let json = serde_json::to_string(&GroupType::DropSet).unwrap();
        assert_eq!(json, "\"drop_set\"");
        let parsed: GroupType = serde_json::from_str("\"superset\"").unwrap();
        assert_eq!(parsed, GroupType::Superset);
        assert!(serde_json::from_str::<GroupType>("\"giant_set\"").is_err());
    }

    #[test]
    fn test_prescription_quantity_flattens() {
        let prescription = ExercisePrescription {
            id: PrescriptionId::new(),
            group_id: GroupId::new(),
            exercise_id: "plank".into(),
            exercise_order: 1,
            sets: Some(3),
            quantity: Quantity::HoldSeconds(45),
            target_weight_kg: None,
            rpe_value_id: None,
        };

        let value = serde_json::to_value(&prescription).unwrap();
        assert_eq!(value["hold_seconds"], 45);
        assert!(value.get("reps").is_none());

        let parsed: ExercisePrescription = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, prescription);
    }

    #[test]
    fn test_progress_flags() {
        let mut block = SessionBlock {
            id: BlockId::new(),
            session_id: SessionId::new(),
            block_order: 1,
            completed_at: None,
            skipped: false,
            perceived_exertion: None,
        };
        assert_eq!(block.progress(), Progress::Pending);

        block.skipped = true;
        assert_eq!(block.progress(), Progress::Skipped);

        block.skipped = false;
        block.completed_at = Some(Utc::now());
        assert_eq!(block.progress(), Progress::Completed);
    }

    #[test]
    fn test_entity_id_parse_roundtrip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SetId>().is_err());
    }
}
