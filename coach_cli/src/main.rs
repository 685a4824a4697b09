mod render;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use coach_core::auth::ROSTER_FILE_NAME;
use coach_core::journal::{journal_path, JOURNAL_DIR_NAME};
use coach_core::prescription::{GroupDraft, GroupUpdate, PrescriptionDraft};
use coach_core::rollup::{cleanup_processed_journals, journal_to_csv_and_archive, ACTIVITY_CSV_NAME};
use coach_core::session::{NewSession, SessionUpdate};
use coach_core::tracking::{NewSet, SetUpdate};
use coach_core::workout::{NewWorkout, WorkoutUpdate};
use coach_core::*;
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "coach")]
#[command(about = "Workout prescription and session tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Acting identity (defaults to $USER)
    #[arg(long = "as", value_name = "USER", global = true)]
    actor: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Author workouts
    Workout {
        #[command(subcommand)]
        action: WorkoutCmd,
    },
    /// Edit prescription groups of a workout
    Group {
        #[command(subcommand)]
        action: GroupCmd,
    },
    /// Start, inspect and end sessions
    Session {
        #[command(subcommand)]
        action: SessionCmd,
    },
    /// Track a session block
    Block {
        #[command(subcommand)]
        action: BlockCmd,
    },
    /// Track an exercise log
    Exercise {
        #[command(subcommand)]
        action: ExerciseCmd,
    },
    /// Track a logged set
    Set {
        #[command(subcommand)]
        action: SetCmd,
    },
    /// Manage trainer-client links
    Client {
        #[command(subcommand)]
        action: ClientCmd,
    },
    /// List the exercise and RPE catalogs
    Catalog,
    /// Roll up the activity journal to CSV
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCmd {
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Estimated duration in minutes
        #[arg(long)]
        minutes: Option<u32>,
    },
    List,
    Show {
        id: WorkoutId,
    },
    Update {
        id: WorkoutId,
        #[arg(long)]
        title: Option<String>,
        /// Empty string clears the description
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        minutes: Option<u32>,
    },
    Delete {
        id: WorkoutId,
    },
    /// Copy a workout's groups and prescriptions under new IDs
    Duplicate {
        id: WorkoutId,
    },
}

#[derive(Subcommand)]
enum GroupCmd {
    /// Add an empty group to a workout
    Add {
        workout_id: WorkoutId,
        /// straight, superset, circuit, drop_set, pyramid or amrap
        #[arg(long = "type", default_value = "straight")]
        group_type: GroupType,
        #[arg(long)]
        order: u32,
        #[arg(long)]
        rounds: Option<u32>,
        /// Rest between sets in seconds
        #[arg(long)]
        rest: Option<u32>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        workout_id: WorkoutId,
    },
    Show {
        id: GroupId,
    },
    Update {
        id: GroupId,
        #[arg(long = "type")]
        group_type: Option<GroupType>,
        #[arg(long)]
        order: Option<u32>,
        /// Empty string clears the rounds
        #[arg(long)]
        rounds: Option<String>,
        /// Rest between sets in seconds; empty string clears it
        #[arg(long)]
        rest: Option<String>,
        /// Empty string clears the name
        #[arg(long)]
        name: Option<String>,
        /// Empty string clears the notes
        #[arg(long)]
        notes: Option<String>,
    },
    Delete {
        workout_id: WorkoutId,
        id: GroupId,
    },
    /// Apply new orders given as GROUP_ID=ORDER pairs; all groups must be listed
    Reorder {
        workout_id: WorkoutId,
        #[arg(required = true)]
        orders: Vec<String>,
    },
    /// Append an exercise prescription after the group's last entry
    Append {
        id: GroupId,
        #[arg(long)]
        exercise: String,
        #[arg(long)]
        sets: Option<u32>,
        #[arg(long, conflicts_with = "hold")]
        reps: Option<u32>,
        /// Hold duration in seconds
        #[arg(long)]
        hold: Option<u32>,
        #[command(flatten)]
        weight: WeightArgs,
        #[arg(long)]
        rpe: Option<u32>,
    },
}

#[derive(Subcommand)]
enum SessionCmd {
    /// Start a session, instantiated from a workout when one is given
    Start {
        /// Performing user (defaults to the acting identity)
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        workout: Option<WorkoutId>,
        #[arg(long)]
        notes: Option<String>,
    },
    Show {
        id: SessionId,
    },
    List {
        #[arg(long)]
        user: Option<String>,
        /// Only sessions started at or after this RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
    Update {
        id: SessionId,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        intensity: Option<u8>,
    },
    End {
        id: SessionId,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        intensity: Option<u8>,
    },
    Delete {
        id: SessionId,
    },
}

#[derive(Subcommand)]
enum BlockCmd {
    Show { id: BlockId },
    Complete { id: BlockId },
    Skip { id: BlockId },
    /// Record perceived exertion (1-10)
    Rpe { id: BlockId, value: u8 },
}

#[derive(Subcommand)]
enum ExerciseCmd {
    Show {
        id: ExerciseLogId,
    },
    Complete {
        id: ExerciseLogId,
    },
    Skip {
        id: ExerciseLogId,
    },
    Notes {
        id: ExerciseLogId,
        text: String,
    },
    /// Append a set after the highest existing set number
    AddSet {
        id: ExerciseLogId,
        #[arg(long, conflicts_with = "hold")]
        reps: Option<u32>,
        #[arg(long)]
        hold: Option<u32>,
        #[command(flatten)]
        weight: WeightArgs,
        #[arg(long)]
        rpe: Option<u32>,
        #[arg(long)]
        completed: bool,
        #[arg(long)]
        failure: bool,
    },
}

#[derive(Subcommand)]
enum SetCmd {
    Show {
        id: SetId,
    },
    Update {
        id: SetId,
        #[arg(long)]
        reps: Option<u32>,
        #[arg(long)]
        hold: Option<u32>,
        #[command(flatten)]
        weight: WeightArgs,
        #[arg(long)]
        rpe: Option<u32>,
        #[arg(long)]
        failure: Option<bool>,
    },
    Complete {
        id: SetId,
        /// Final rep count
        #[arg(long)]
        reps: Option<u32>,
    },
    Delete {
        id: SetId,
    },
}

#[derive(Subcommand)]
enum ClientCmd {
    /// As a trainer, request a link to a client
    Invite { client: String },
    /// As a client, accept a trainer's request
    Accept { trainer: String },
    /// As a client, reject a request or end a link
    Reject { trainer: String },
    /// Links involving the acting identity
    List,
}

#[derive(Args)]
struct WeightArgs {
    #[arg(long)]
    weight: Option<f64>,
    /// kg or lb (defaults to the configured display unit)
    #[arg(long, requires = "weight")]
    unit: Option<WeightUnit>,
}

impl WeightArgs {
    fn resolve(&self, default_unit: WeightUnit) -> Option<Weight> {
        self.weight
            .map(|value| Weight::new(value, self.unit.unwrap_or(default_unit)))
    }
}

/// Everything a command needs, resolved once per invocation
struct App {
    data_dir: PathBuf,
    config: Config,
    actor: UserId,
    store: FileStore,
    roster: ClientRoster,
    catalog: Cow<'static, Catalog>,
    json: bool,
}

impl App {
    fn unit(&self) -> WeightUnit {
        self.config.display.weight_unit
    }

    fn workouts(&self) -> WorkoutService<'_, FileStore> {
        WorkoutService::new(&self.store)
    }

    fn editor(&self) -> PrescriptionEditor<'_, FileStore> {
        PrescriptionEditor::new(&self.store, &*self.catalog, &*self.catalog)
    }

    fn sessions(&self) -> SessionService<'_, FileStore> {
        SessionService::new(&self.store, &self.roster)
    }

    fn tracker(&self) -> SessionTracker<'_, FileStore> {
        SessionTracker::new(&self.store, &self.roster, &*self.catalog)
    }

    /// Append a journal entry for a session mutation
    ///
    /// The mutation is already committed when this runs, so a journal
    /// failure is reported as a warning rather than failing the command.
    fn journal(&self, session_id: SessionId, action: &str) {
        let entry = ActivityEntry::now(&self.actor, session_id, action);
        if let Err(e) = JsonlJournal::in_dir(&self.data_dir).append(&entry) {
            tracing::warn!(
                "Change saved, but journaling {} on session {} failed: {}",
                action,
                session_id,
                e
            );
        }
    }

    fn session_of_block(&self, id: BlockId) -> Result<SessionId> {
        Ok(self.tracker().block(&self.actor, id)?.block.session_id)
    }

    fn session_of_log(&self, id: ExerciseLogId) -> Result<SessionId> {
        let log = self.tracker().exercise_log(&self.actor, id)?;
        self.session_of_block(log.log.block_id)
    }

    fn session_of_set(&self, id: SetId) -> Result<SessionId> {
        let set = self.tracker().set(&self.actor, id)?;
        self.session_of_log(set.exercise_log_id)
    }

    /// Print `value` as JSON, or run the human-readable renderer
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    coach_core::logging::init_with_level("warn");

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    std::fs::create_dir_all(&data_dir)?;

    let actor = cli
        .actor
        .or_else(|| std::env::var("USER").ok())
        .filter(|a| !a.trim().is_empty())
        .map(UserId::new)
        .ok_or_else(|| Error::Config("no acting identity; pass --as <user>".into()))?;

    let catalog = config.load_catalog()?;
    let app = App {
        store: FileStore::in_dir(&data_dir),
        roster: ClientRoster::load(&data_dir.join(ROSTER_FILE_NAME))?,
        data_dir,
        config,
        actor,
        catalog,
        json: cli.json,
    };
    tracing::debug!("Acting as {} in {:?}", app.actor, app.data_dir);

    match cli.command {
        Commands::Workout { action } => cmd_workout(&app, action),
        Commands::Group { action } => cmd_group(&app, action),
        Commands::Session { action } => cmd_session(&app, action),
        Commands::Block { action } => cmd_block(&app, action),
        Commands::Exercise { action } => cmd_exercise(&app, action),
        Commands::Set { action } => cmd_set(&app, action),
        Commands::Client { action } => cmd_client(&app, action),
        Commands::Catalog => cmd_catalog(&app),
        Commands::Rollup { cleanup } => cmd_rollup(&app, cleanup),
    }
}

fn cmd_workout(app: &App, action: WorkoutCmd) -> Result<()> {
    let service = app.workouts();
    match action {
        WorkoutCmd::Create {
            title,
            description,
            minutes,
        } => {
            let workout = service.create_workout(
                &app.actor,
                NewWorkout {
                    title,
                    description,
                    estimated_minutes: minutes,
                },
            )?;
            app.emit(&workout, || println!("{}", workout.id))
        }
        WorkoutCmd::List => {
            let workouts = service.list_workouts(&app.actor)?;
            app.emit(&workouts, || render::workouts(&workouts))
        }
        WorkoutCmd::Show { id } => {
            let detail = service.workout(&app.actor, id)?;
            app.emit(&detail, || render::workout(&detail, app.unit()))
        }
        WorkoutCmd::Update {
            id,
            title,
            description,
            minutes,
        } => {
            let workout = service.update_workout(
                &app.actor,
                id,
                WorkoutUpdate {
                    title,
                    description: description.map(|d| Some(d).filter(|d| !d.is_empty())),
                    estimated_minutes: minutes.map(Some),
                },
            )?;
            app.emit(&workout, || println!("Updated workout {}", workout.id))
        }
        WorkoutCmd::Delete { id } => {
            service.delete_workout(&app.actor, id)?;
            println!("Deleted workout {}", id);
            Ok(())
        }
        WorkoutCmd::Duplicate { id } => {
            let detail = service.duplicate_workout(&app.actor, id)?;
            app.emit(&detail, || println!("{}", detail.workout.id))
        }
    }
}

fn parse_order_pair(pair: &str) -> Result<(GroupId, u32)> {
    let invalid = || Error::Validation(format!("expected GROUP_ID=ORDER, got '{}'", pair));
    let (id, order) = pair.split_once('=').ok_or_else(invalid)?;
    let id = id.trim().parse::<GroupId>().map_err(|_| invalid())?;
    let order = order.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((id, order))
}

/// `Some("")` clears the field, anything else must be a count
fn clearable_count(field: &str, value: Option<String>) -> Result<Option<Option<u32>>> {
    match value.as_deref().map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(text) => text.parse::<u32>().map(|n| Some(Some(n))).map_err(|_| {
            Error::Validation(format!("--{} expects a whole number, got '{}'", field, text))
        }),
    }
}

fn clearable_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| Some(v).filter(|v| !v.trim().is_empty()))
}

fn cmd_group(app: &App, action: GroupCmd) -> Result<()> {
    let editor = app.editor();
    match action {
        GroupCmd::Add {
            workout_id,
            group_type,
            order,
            rounds,
            rest,
            name,
            notes,
        } => {
            let draft = GroupDraft {
                group_rounds: rounds,
                rest_between_sets: rest,
                group_name: name,
                group_notes: notes,
                ..GroupDraft::new(group_type, order)
            };
            let detail = editor.create_group(&app.actor, workout_id, draft)?;
            app.emit(&detail, || println!("{}", detail.group.id))
        }
        GroupCmd::List { workout_id } => {
            let groups = editor.groups(&app.actor, workout_id)?;
            app.emit(&groups, || {
                for group in &groups {
                    render::group(group, app.unit());
                }
            })
        }
        GroupCmd::Show { id } => {
            let detail = editor.group(&app.actor, id)?;
            app.emit(&detail, || render::group(&detail, app.unit()))
        }
        GroupCmd::Update {
            id,
            group_type,
            order,
            rounds,
            rest,
            name,
            notes,
        } => {
            let update = GroupUpdate {
                group_type,
                group_order: order,
                group_rounds: clearable_count("rounds", rounds)?,
                rest_between_sets: clearable_count("rest", rest)?,
                group_name: clearable_text(name),
                group_notes: clearable_text(notes),
                exercises: None,
            };
            let detail = editor.update_group(&app.actor, id, update)?;
            app.emit(&detail, || render::group(&detail, app.unit()))
        }
        GroupCmd::Delete { workout_id, id } => {
            editor.delete_group(&app.actor, workout_id, id)?;
            println!("Deleted group {}", id);
            Ok(())
        }
        GroupCmd::Reorder { workout_id, orders } => {
            let pairs = orders
                .iter()
                .map(|p| parse_order_pair(p))
                .collect::<Result<Vec<_>>>()?;
            let groups = editor.reorder_groups(&app.actor, workout_id, &pairs)?;
            app.emit(&groups, || {
                for group in &groups {
                    println!("{:>4}  {}  {}", group.group_order, group.id, group.group_type);
                }
            })
        }
        GroupCmd::Append {
            id,
            exercise,
            sets,
            reps,
            hold,
            weight,
            rpe,
        } => {
            let draft = PrescriptionDraft {
                exercise_id: ExerciseId::new(exercise),
                exercise_order: None,
                sets,
                reps,
                hold_seconds: hold,
                target_weight: weight.resolve(app.unit()),
                rpe_value_id: rpe.map(RpeValueId),
            };
            let prescription = editor.append_exercise(&app.actor, id, draft)?;
            app.emit(&prescription, || println!("{}", prescription.id))
        }
    }
}

fn cmd_session(app: &App, action: SessionCmd) -> Result<()> {
    let service = app.sessions();
    match action {
        SessionCmd::Start {
            user,
            workout,
            notes,
        } => {
            let user = user.map(UserId::new).unwrap_or_else(|| app.actor.clone());
            let detail = service.create_session(
                &app.actor,
                &user,
                NewSession {
                    workout_id: workout,
                    notes,
                },
            )?;
            app.journal(detail.session.id, "session.create");
            app.emit(&detail, || println!("{}", detail.session.id))
        }
        SessionCmd::Show { id } => {
            let detail = service.session(&app.actor, id)?;
            app.emit(&detail, || render::session(&detail, app.unit()))
        }
        SessionCmd::List { user, since } => {
            let user = user.map(UserId::new).unwrap_or_else(|| app.actor.clone());
            let sessions = service.list_sessions(&app.actor, &user, since)?;
            app.emit(&sessions, || render::sessions(&sessions))
        }
        SessionCmd::Update {
            id,
            notes,
            intensity,
        } => {
            let session = service.update_session(
                &app.actor,
                id,
                SessionUpdate {
                    notes: notes.map(|n| Some(n).filter(|n| !n.is_empty())),
                    perceived_intensity: intensity.map(Some),
                },
            )?;
            app.journal(id, "session.update");
            app.emit(&session, || println!("Updated session {}", id))
        }
        SessionCmd::End {
            id,
            notes,
            intensity,
        } => {
            let session = service.end_session(&app.actor, id, notes, intensity)?;
            app.journal(id, "session.end");
            app.emit(&session, || println!("Ended session {}", id))
        }
        SessionCmd::Delete { id } => {
            service.delete_session(&app.actor, id)?;
            app.journal(id, "session.delete");
            println!("Deleted session {}", id);
            Ok(())
        }
    }
}

fn cmd_block(app: &App, action: BlockCmd) -> Result<()> {
    let tracker = app.tracker();
    let (block, action) = match action {
        BlockCmd::Show { id } => {
            let detail = tracker.block(&app.actor, id)?;
            return app.emit(&detail, || render::block(&detail, app.unit()));
        }
        BlockCmd::Complete { id } => (tracker.complete_block(&app.actor, id)?, "block.complete"),
        BlockCmd::Skip { id } => (tracker.skip_block(&app.actor, id)?, "block.skip"),
        BlockCmd::Rpe { id, value } => (
            tracker.update_block_rpe(&app.actor, id, Some(value))?,
            "block.rpe",
        ),
    };
    app.journal(block.session_id, action);
    app.emit(&block, || println!("Block {} is {}", block.id, block.progress()))
}

fn cmd_exercise(app: &App, action: ExerciseCmd) -> Result<()> {
    let tracker = app.tracker();
    match action {
        ExerciseCmd::Show { id } => {
            let detail = tracker.exercise_log(&app.actor, id)?;
            app.emit(&detail, || render::exercise_log(&detail, app.unit()))
        }
        ExerciseCmd::Complete { id } => {
            let session_id = app.session_of_log(id)?;
            let log = tracker.complete_exercise_log(&app.actor, id)?;
            app.journal(session_id, "exercise.complete");
            app.emit(&log, || println!("Exercise {} is {}", log.id, log.progress()))
        }
        ExerciseCmd::Skip { id } => {
            let session_id = app.session_of_log(id)?;
            let log = tracker.skip_exercise_log(&app.actor, id)?;
            app.journal(session_id, "exercise.skip");
            app.emit(&log, || println!("Exercise {} is {}", log.id, log.progress()))
        }
        ExerciseCmd::Notes { id, text } => {
            let notes = Some(text).filter(|t| !t.trim().is_empty());
            let session_id = app.session_of_log(id)?;
            let log = tracker.update_exercise_log_notes(&app.actor, id, notes)?;
            app.journal(session_id, "exercise.notes");
            app.emit(&log, || println!("Updated notes on exercise {}", log.id))
        }
        ExerciseCmd::AddSet {
            id,
            reps,
            hold,
            weight,
            rpe,
            completed,
            failure,
        } => {
            let session_id = app.session_of_log(id)?;
            let set = tracker.add_set(
                &app.actor,
                id,
                NewSet {
                    actual_reps: reps,
                    hold_seconds_actual: hold,
                    weight: weight.resolve(app.unit()),
                    rpe_value_id: rpe.map(RpeValueId),
                    completed,
                    was_failure: failure,
                },
            )?;
            app.journal(session_id, "set.add");
            app.emit(&set, || println!("{}", set.id))
        }
    }
}

fn cmd_set(app: &App, action: SetCmd) -> Result<()> {
    let tracker = app.tracker();
    match action {
        SetCmd::Show { id } => {
            let set = tracker.set(&app.actor, id)?;
            app.emit(&set, || render::set(&set, app.unit()))
        }
        SetCmd::Update {
            id,
            reps,
            hold,
            weight,
            rpe,
            failure,
        } => {
            let update = SetUpdate {
                actual_reps: reps.map(Some),
                hold_seconds_actual: hold.map(Some),
                weight: weight.resolve(app.unit()).map(Some),
                rpe_value_id: rpe.map(|r| Some(RpeValueId(r))),
                completed: None,
                was_failure: failure,
            };
            let session_id = app.session_of_set(id)?;
            let set = tracker.update_set(&app.actor, id, update)?;
            app.journal(session_id, "set.update");
            app.emit(&set, || render::set(&set, app.unit()))
        }
        SetCmd::Complete { id, reps } => {
            let session_id = app.session_of_set(id)?;
            let set = tracker.complete_set(&app.actor, id, reps)?;
            app.journal(session_id, "set.complete");
            app.emit(&set, || render::set(&set, app.unit()))
        }
        SetCmd::Delete { id } => {
            let session_id = app.session_of_set(id)?;
            tracker.delete_set(&app.actor, id)?;
            app.journal(session_id, "set.delete");
            println!("Deleted set {}", id);
            Ok(())
        }
    }
}

fn cmd_client(app: &App, action: ClientCmd) -> Result<()> {
    let path = app.data_dir.join(ROSTER_FILE_NAME);
    match action {
        ClientCmd::Invite { client } => {
            let client = UserId::new(client);
            let status = ClientRoster::update(&path, |r| r.invite(&app.actor, &client))?;
            println!("Link {} -> {} is {:?}", app.actor, client, status);
        }
        ClientCmd::Accept { trainer } => {
            let trainer = UserId::new(trainer);
            ClientRoster::update(&path, |r| r.accept(&trainer, &app.actor))?;
            println!("Accepted {} as trainer", trainer);
        }
        ClientCmd::Reject { trainer } => {
            let trainer = UserId::new(trainer);
            ClientRoster::update(&path, |r| r.reject(&trainer, &app.actor))?;
            println!("Rejected {} as trainer", trainer);
        }
        ClientCmd::List => {
            let links: Vec<_> = app
                .roster
                .links()
                .iter()
                .filter(|l| l.trainer_id == app.actor || l.client_id == app.actor)
                .collect();
            app.emit(&links, || {
                for link in &links {
                    println!("{} -> {}  {:?}", link.trainer_id, link.client_id, link.status);
                }
            })?;
        }
    }
    Ok(())
}

fn cmd_catalog(app: &App) -> Result<()> {
    let mut exercises: Vec<_> = app.catalog.exercises.values().collect();
    exercises.sort_by(|a, b| a.id.cmp(&b.id));
    let rpe_values: Vec<_> = app.catalog.rpe_values.values().collect();

    #[derive(Serialize)]
    struct Listing<'a> {
        exercises: &'a [&'a coach_core::catalog::Exercise],
        rpe_values: &'a [&'a coach_core::catalog::RpeValue],
    }

    app.emit(
        &Listing {
            exercises: &exercises,
            rpe_values: &rpe_values,
        },
        || render::catalog(&exercises, &rpe_values),
    )
}

fn cmd_rollup(app: &App, cleanup: bool) -> Result<()> {
    let journal = journal_path(&app.data_dir);
    let csv_path = app.data_dir.join(ACTIVITY_CSV_NAME);

    if !journal.exists() {
        println!("No journal found - nothing to roll up.");
        return Ok(());
    }

    let count = journal_to_csv_and_archive(&journal, &csv_path)?;
    println!("✓ Rolled up {} journal entries to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = cleanup_processed_journals(&app.data_dir.join(JOURNAL_DIR_NAME))?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal files", cleaned);
        }
    }

    Ok(())
}
