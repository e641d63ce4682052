use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use lifesync_core::habit::{self, DayStatus};
use lifesync_core::*;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);
const CALENDAR_MONTHS: u32 = 4;

#[derive(Parser)]
#[command(name = "lifesync")]
#[command(about = "Workout sessions and daily habits", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the exercise catalog
    Exercises {
        /// Only show one body part ("All" for everything)
        #[arg(long)]
        body_part: Option<String>,

        /// Case-insensitive name search
        #[arg(long)]
        search: Option<String>,
    },

    /// Manage workout templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Run workouts and review history
    Workout {
        #[command(subcommand)]
        command: WorkoutCommand,
    },

    /// Track daily habits
    Habit {
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long, global = true)]
        today: Option<NaiveDate>,

        #[command(subcommand)]
        command: HabitCommand,
    },
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List saved templates
    List,

    /// Show a template's exercises and planned sets
    Show { id: String },

    /// Create a template
    Create {
        #[arg(long)]
        name: String,

        /// EXERCISE_ID:REPS[,REPS...], e.g. ex1:12,10,8 (repeatable, in order)
        #[arg(long = "exercise", required = true)]
        exercises: Vec<String>,
    },

    /// Change a template's name, exercises or planned sets
    ///
    /// Changes apply in option order: name, exercises, toggles, added sets,
    /// removed sets, moves.
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// Replace every exercise: EXERCISE_ID:REPS[,REPS...] (repeatable)
        #[arg(long = "exercise")]
        exercises: Vec<String>,

        /// Add an exercise with one set, or remove it: EXERCISE_ID:REPS
        #[arg(long)]
        toggle: Vec<String>,

        /// Append a planned set: EXERCISE_ID:REPS
        #[arg(long)]
        add_set: Vec<String>,

        /// Remove a planned set and renumber the rest: EXERCISE_ID:SET
        #[arg(long)]
        remove_set: Vec<String>,

        /// Move an exercise between positions: FROM:TO, counting from 1
        #[arg(long = "move")]
        moves: Vec<String>,
    },

    /// Delete a template
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// Start a guided session from a template
    Start {
        template_id: String,

        /// Record every planned set as planned, without rests (for testing)
        #[arg(long)]
        auto_complete: bool,

        /// Rest between sets, overriding the config
        #[arg(long)]
        rest_seconds: Option<u32>,
    },

    /// List completed sessions, newest first
    History,

    /// Max reps per session for one exercise, or the exercises performed so far
    Progress { exercise_id: Option<String> },

    /// Export every logged set to CSV
    Export { path: PathBuf },
}

#[derive(Subcommand)]
enum HabitCommand {
    /// List habits with today's progress
    List,

    /// Add a habit (a checkbox count unless --minutes is given)
    Add {
        #[arg(long)]
        name: String,

        /// Daily target count
        #[arg(long, conflicts_with = "minutes")]
        count: Option<u32>,

        /// Daily target in minutes; the configured default if no value is given
        #[arg(long, num_args = 0..=1)]
        minutes: Option<Option<u32>>,
    },

    /// Rename a habit or change its target
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "minutes")]
        count: Option<u32>,

        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Count progress on a checkbox habit
    Track {
        id: String,

        /// Amount to add; negative to undo
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        by: i64,
    },

    /// Log minutes against a time habit
    Log {
        id: String,

        #[arg(allow_hyphen_values = true)]
        minutes: String,
    },

    /// Delete a habit
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show the completion calendar
    Calendar {
        id: String,

        #[arg(long, default_value_t = CALENDAR_MONTHS)]
        months: u32,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    lifesync_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    match cli.command {
        Commands::Exercises { body_part, search } => {
            cmd_exercises(body_part.as_deref(), search.as_deref())
        }
        Commands::Template { command } => cmd_template(command, &config),
        Commands::Workout { command } => cmd_workout(command, &config),
        Commands::Habit { today, command } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            cmd_habit(command, today, &config)
        }
    }
}

fn catalog() -> Result<&'static ExerciseCatalog> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Other("Invalid exercise catalog".into()));
    }
    Ok(catalog)
}

fn cmd_exercises(body_part: Option<&str>, search: Option<&str>) -> Result<()> {
    let catalog = catalog()?;
    let exercises = catalog.filter(body_part, search);

    if exercises.is_empty() {
        println!("No exercises match.");
        println!("Body parts: {}", catalog.body_parts().join(", "));
        return Ok(());
    }

    for exercise in exercises {
        println!(
            "  {:<5} {:<24} {}",
            exercise.id, exercise.name, exercise.body_part
        );
    }
    Ok(())
}

// ============================================================================
// Templates
// ============================================================================

fn cmd_template(command: TemplateCommand, config: &Config) -> Result<()> {
    let mut library = TemplateLibrary::new(JsonFileCollection::new(config.data.templates_path()));

    match command {
        TemplateCommand::List => {
            let templates = library.list()?;
            if templates.is_empty() {
                println!("No workout templates yet.");
            }
            for template in templates {
                println!(
                    "  {}  {} ({} exercises)",
                    template.id,
                    template.name,
                    template.exercises.len()
                );
            }
        }

        TemplateCommand::Show { id } => {
            print_template(&library.get(&id)?);
        }

        TemplateCommand::Create { name, exercises } => {
            let template_exercises = parse_template_exercises(&exercises, catalog()?)?;
            let created = library.create(WorkoutTemplate::new(&name, template_exercises))?;
            println!("✓ Created template '{}' ({})", created.name, created.id);
        }

        TemplateCommand::Edit {
            id,
            name,
            exercises,
            toggle,
            add_set,
            remove_set,
            moves,
        } => {
            let catalog = catalog()?;
            let mut draft = library.get(&id)?;

            if let Some(name) = name {
                draft.name = name;
            }
            if !exercises.is_empty() {
                draft.exercises = parse_template_exercises(&exercises, catalog)?;
            }
            for arg in &toggle {
                let (exercise_id, reps) = split_arg(arg, "EXERCISE_ID:REPS")?;
                let exercise = lookup_exercise(catalog, exercise_id)?;
                draft.toggle_exercise(exercise, parse_planned_reps(reps)?);
            }
            for arg in &add_set {
                let (exercise_id, reps) = split_arg(arg, "EXERCISE_ID:REPS")?;
                let reps = parse_planned_reps(reps)?;
                template_exercise_mut(&mut draft, exercise_id)?.add_planned_set(reps);
            }
            for arg in &remove_set {
                let (exercise_id, set) = split_arg(arg, "EXERCISE_ID:SET")?;
                let set_number = parse_position(set)?;
                if !template_exercise_mut(&mut draft, exercise_id)?.remove_planned_set(set_number as u32) {
                    return Err(Error::NotFound(format!(
                        "set {} of exercise {}",
                        set_number, exercise_id
                    )));
                }
            }
            for arg in &moves {
                let (from, to) = split_arg(arg, "FROM:TO")?;
                draft.reorder_exercise(parse_position(from)? - 1, parse_position(to)? - 1)?;
            }

            let updated = library.update(&id, &draft.name, draft.exercises)?;
            println!("✓ Updated template '{}'", updated.name);
            print_template(&updated);
        }

        TemplateCommand::Delete { id, yes } => {
            let deleted = library.delete(&id, |t| {
                yes || confirm(&format!("Delete workout template '{}'?", t.name))
            })?;
            if deleted {
                println!("✓ Template deleted");
            } else {
                println!("Kept template.");
            }
        }
    }

    Ok(())
}

fn print_template(template: &WorkoutTemplate) {
    println!("{}", template.name);
    for te in &template.exercises {
        let reps: Vec<String> = te.planned_sets.iter().map(|s| s.reps.to_string()).collect();
        println!(
            "  {} ({}): {}",
            te.exercise.name,
            te.exercise.body_part,
            reps.join(", ")
        );
    }
}

/// Parse repeated `ex1:12,10,8` arguments, each exercise at most once
fn parse_template_exercises(
    args: &[String],
    catalog: &ExerciseCatalog,
) -> Result<Vec<TemplateExercise>> {
    let mut seen = HashSet::new();
    let mut template_exercises = Vec::with_capacity(args.len());
    for arg in args {
        let (exercise_id, reps) = split_arg(arg, "EXERCISE_ID:REPS[,REPS...]")?;
        let exercise = lookup_exercise(catalog, exercise_id)?;
        if !seen.insert(exercise.id.clone()) {
            return Err(Error::Validation(format!(
                "'{}' is listed more than once",
                exercise.name
            )));
        }
        let reps = reps
            .split(',')
            .map(parse_planned_reps)
            .collect::<Result<Vec<u32>>>()?;
        template_exercises.push(TemplateExercise::with_reps(exercise.clone(), &reps));
    }
    Ok(template_exercises)
}

fn split_arg<'a>(arg: &'a str, expected: &str) -> Result<(&'a str, &'a str)> {
    arg.split_once(':')
        .map(|(left, right)| (left.trim(), right.trim()))
        .ok_or_else(|| Error::Validation(format!("Expected {}, got '{}'", expected, arg)))
}

fn lookup_exercise<'c>(catalog: &'c ExerciseCatalog, id: &str) -> Result<&'c Exercise> {
    catalog
        .get(id)
        .ok_or_else(|| Error::NotFound(format!("exercise {}", id)))
}

fn template_exercise_mut<'t>(
    template: &'t mut WorkoutTemplate,
    exercise_id: &str,
) -> Result<&'t mut TemplateExercise> {
    let name = template.name.clone();
    template
        .exercise_mut(exercise_id)
        .ok_or_else(|| Error::NotFound(format!("exercise {} in template '{}'", exercise_id, name)))
}

fn parse_planned_reps(input: &str) -> Result<u32> {
    match parse_reps(input)? {
        0 => Err(Error::Validation(
            "All selected exercises must have at least one planned set with reps filled.".into(),
        )),
        n => Ok(n),
    }
}

/// A 1-based position typed by the user
fn parse_position(input: &str) -> Result<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(Error::Validation(format!(
            "'{}' is not a position (1, 2, 3, ...)",
            input.trim()
        ))),
    }
}

// ============================================================================
// Workouts
// ============================================================================

fn cmd_workout(command: WorkoutCommand, config: &Config) -> Result<()> {
    let mut history = SessionHistory::new(JsonFileCollection::new(config.data.sessions_path()));

    match command {
        WorkoutCommand::Start {
            template_id,
            auto_complete,
            rest_seconds,
        } => {
            let library =
                TemplateLibrary::new(JsonFileCollection::new(config.data.templates_path()));

            let rest_seconds = if auto_complete {
                0
            } else {
                rest_seconds.unwrap_or(config.workout.rest_seconds)
            };
            let mut engine = library.start(&template_id, Utc::now(), rest_seconds)?;
            println!("Starting '{}'", engine.session().template_name);

            if auto_complete {
                while let Some(reps) = engine.suggested_reps() {
                    engine.record_set(reps, Utc::now())?;
                }
                if engine.cursor().is_some() {
                    engine.finish(Utc::now())?;
                }
            } else {
                run_interactive(&mut engine)?;
            }

            let session = engine.into_session();
            if session.status == SessionStatus::Completed {
                if set_counts(&session).0 == 0 {
                    println!("No sets logged. Nothing was saved.");
                } else {
                    history.append(&session)?;
                    print_summary(&session);
                }
            } else {
                println!("Workout cancelled. Nothing was saved.");
            }
        }

        WorkoutCommand::History => {
            let sessions = history.list_newest_first()?;
            if sessions.is_empty() {
                println!("No completed workouts yet.");
            }
            for session in sessions {
                let (done, planned) = set_counts(&session);
                println!(
                    "  {}  {:<20} {}  {}/{} sets",
                    session.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    session.template_name,
                    format_duration(session.duration_seconds.unwrap_or(0)),
                    done,
                    planned
                );
            }
        }

        WorkoutCommand::Progress { exercise_id } => match exercise_id {
            Some(id) => {
                let points = history.exercise_progress(&id)?;
                if points.is_empty() {
                    println!("No progress recorded for {}.", id);
                }
                for point in points {
                    println!(
                        "  {}  {} reps",
                        point.performed_at.with_timezone(&Local).format("%Y-%m-%d"),
                        point.max_reps
                    );
                }
            }
            None => {
                let exercises = history.performed_exercises(catalog()?)?;
                if exercises.is_empty() {
                    println!("No exercises performed yet.");
                }
                for exercise in exercises {
                    println!("  {:<5} {}", exercise.id, exercise.name);
                }
            }
        },

        WorkoutCommand::Export { path } => {
            let mut sessions = history.list_newest_first()?;
            sessions.reverse();
            let rows = export_sessions_csv(&sessions, &path)?;
            println!("✓ Exported {} sets to {}", rows, path.display());
        }
    }

    Ok(())
}

/// Drive the engine from stdin lines and a one-second tick
fn run_interactive(engine: &mut WorkoutSessionEngine) -> Result<()> {
    let lines = spawn_stdin_reader();

    println!("Enter reps (Enter = suggested), 'p' pause, 's' skip rest, 'f' finish, 'c' cancel");
    print_current(engine);

    let mut next_tick = Instant::now() + TICK;
    while !engine.state().is_terminal() {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match lines.recv_timeout(wait) {
            Ok(line) => {
                if let Err(e) = handle_line(engine, line.trim()) {
                    println!("  {}", e);
                    print_current(engine);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Input closed, finishing session");
                engine.finish(Utc::now())?;
                break;
            }
        }

        while Instant::now() >= next_tick && !engine.state().is_terminal() {
            on_tick(engine);
            next_tick += TICK;
        }
    }

    println!();
    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn handle_line(engine: &mut WorkoutSessionEngine, input: &str) -> Result<()> {
    let now = Utc::now();

    match input.to_lowercase().as_str() {
        "p" => {
            engine.toggle_pause()?;
            if matches!(engine.state(), SessionState::Paused { .. }) {
                println!("  Paused. 'p' to resume.");
            } else {
                println!("  Resumed.");
                print_current(engine);
            }
        }
        "s" => {
            engine.skip_rest(now)?;
            print_current(engine);
        }
        "f" => {
            engine.finish(now)?;
        }
        "c" => {
            engine.cancel()?;
        }
        "" => {
            let reps = engine
                .suggested_reps()
                .ok_or_else(|| Error::Session("No set to record".into()))?;
            let outcome = engine.record_set(reps, now)?;
            report_record(engine, outcome);
        }
        other => {
            let outcome = engine.record_set_input(other, now)?;
            report_record(engine, outcome);
        }
    }

    Ok(())
}

fn on_tick(engine: &mut WorkoutSessionEngine) {
    match engine.tick(Utc::now()) {
        TickOutcome::RestFinished(_) => {
            println!();
            println!("  Rest over.");
            print_current(engine);
        }
        TickOutcome::Ticked => {
            if let SessionState::Resting { remaining_seconds } = engine.state() {
                print!("\r  Rest {}   ", format_rest(remaining_seconds));
                let _ = io::stdout().flush();
            }
        }
        TickOutcome::Idle => {}
    }
}

fn report_record(engine: &WorkoutSessionEngine, outcome: RecordOutcome) {
    match outcome {
        RecordOutcome::Resting { seconds } => {
            println!("  Logged. Rest {} ('s' to skip)", format_rest(seconds));
        }
        RecordOutcome::Advanced(_) => print_current(engine),
        RecordOutcome::Completed => {}
    }
}

fn print_current(engine: &WorkoutSessionEngine) {
    let Some(current) = engine.current_set() else {
        return;
    };

    println!();
    println!(
        "Round {}/{}  ·  Exercise {}/{}  ·  {}",
        current.set_number,
        engine.max_rounds(),
        current.exercise_index + 1,
        current.exercise_count,
        format_duration(engine.elapsed_seconds())
    );
    println!(
        "  {} ({}), set {} of {}: {} reps planned",
        current.exercise.exercise_name,
        current.exercise.body_part,
        current.set_number,
        current.set_count,
        current.planned_reps.unwrap_or(0)
    );
    if let SessionState::Paused { .. } = engine.state() {
        println!("  (paused)");
    }
    print!("reps [{}]> ", engine.suggested_reps().unwrap_or(0));
    let _ = io::stdout().flush();
}

fn print_summary(session: &WorkoutSession) {
    let (done, planned) = set_counts(session);
    println!("✓ Workout complete: {}", session.template_name);
    println!(
        "  Duration: {}",
        format_duration(session.duration_seconds.unwrap_or(0))
    );
    println!("  Sets: {}/{}", done, planned);
    for exercise in &session.logged_exercises {
        let reps: Vec<String> = exercise
            .logged_sets
            .iter()
            .map(|s| s.actual_reps.map_or_else(|| "-".to_string(), |r| r.to_string()))
            .collect();
        println!("  {}: {}", exercise.exercise_name, reps.join(", "));
    }
}

fn set_counts(session: &WorkoutSession) -> (usize, usize) {
    session
        .logged_exercises
        .iter()
        .fold((0, 0), |(done, planned), e| {
            (done + e.completed_sets(), planned + e.planned_sets.len())
        })
}

// ============================================================================
// Habits
// ============================================================================

fn cmd_habit(command: HabitCommand, today: NaiveDate, config: &Config) -> Result<()> {
    let mut book = HabitBook::new(JsonFileCollection::new(config.data.habits_path()));

    match command {
        HabitCommand::List => {
            let habits = book.list(today)?;
            if habits.is_empty() {
                println!("No habits yet.");
            }
            for h in &habits {
                print_habit(h);
            }
        }

        HabitCommand::Add {
            name,
            count,
            minutes,
        } => {
            let minutes = minutes.map(|m| m.unwrap_or(config.habits.default_target_time));
            let tracking = tracking_from_args(count, minutes).unwrap_or_else(|| {
                habit::tracking_for(HabitKind::Checkbox, config.habits.default_target_count)
            });
            let added = book.add(&name, tracking, today)?;
            println!("✓ Added habit '{}' ({})", added.name, added.id);
        }

        HabitCommand::Edit {
            id,
            name,
            count,
            minutes,
        } => {
            let existing = book.get(&id, today)?;
            let name = name.unwrap_or_else(|| existing.name.clone());
            let tracking = tracking_from_args(count, minutes).unwrap_or(existing.tracking);
            let edited = book.edit(&id, &name, tracking, today)?;
            print_habit(&edited);
        }

        HabitCommand::Track { id, by } => {
            let tracked = book.track(&id, by, today)?;
            print_habit(&tracked);
        }

        HabitCommand::Log { id, minutes } => {
            let logged = book.log_time(&id, &minutes, today)?;
            print_habit(&logged);
        }

        HabitCommand::Delete { id, yes } => {
            let deleted = book.delete(&id, |h| {
                yes || confirm(&format!("Delete habit '{}'?", h.name))
            })?;
            if deleted {
                println!("✓ Habit deleted");
            } else {
                println!("Kept habit.");
            }
        }

        HabitCommand::Calendar { id, months } => {
            let h = book.get(&id, today)?;
            print_calendar(&h, today, months);
        }
    }

    Ok(())
}

fn tracking_from_args(count: Option<u32>, minutes: Option<u32>) -> Option<HabitTracking> {
    match (count, minutes) {
        (_, Some(minutes)) => Some(habit::tracking_for(HabitKind::Time, minutes)),
        (Some(count), None) => Some(habit::tracking_for(HabitKind::Checkbox, count)),
        (None, None) => None,
    }
}

fn print_habit(h: &Habit) {
    let mark = if h.completed_today { "x" } else { " " };
    let progress = match h.tracking.kind() {
        HabitKind::Checkbox => format!("{}/{}", h.tracking.progress(), h.tracking.target()),
        HabitKind::Time => format!(
            "{}/{} min",
            h.tracking.progress(),
            h.tracking.target()
        ),
    };
    println!(
        "  [{}] {:<24} {:<12} streak {:<4} {}",
        mark, h.name, progress, h.streak, h.id
    );
}

fn print_calendar(h: &Habit, today: NaiveDate, months: u32) {
    println!("{}  (streak {}, best {})", h.name, h.streak, habit::longest_streak(h));

    for month in habit::completion_calendar(h, today, months) {
        let title = NaiveDate::from_ymd_opt(month.year, month.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default();
        println!();
        println!("  {}", title);
        println!("  Su  Mo  Tu  We  Th  Fr  Sa");

        let mut line = String::from("  ");
        let mut column = 0;
        for _ in 0..month.leading_blanks {
            line.push_str("    ");
            column += 1;
        }
        for (day, status) in &month.days {
            let cell = match status {
                DayStatus::Completed => format!("{:>2}* ", day.day()),
                DayStatus::Missed => format!("{:>2}  ", day.day()),
                DayStatus::Future => " .  ".to_string(),
            };
            line.push_str(&cell);
            column += 1;
            if column % 7 == 0 {
                println!("{}", line.trim_end());
                line = String::from("  ");
            }
        }
        if column % 7 != 0 {
            println!("{}", line.trim_end());
        }
    }

    println!();
    println!("  * target met");
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    let _ = io::stdout().flush();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
