use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use fitcore_core::archive::{archive_days_before, daily_totals};
use fitcore_core::steps::week_starting_monday;
use fitcore_core::profile::{
    KEY_ACTIVITY_LEVEL, KEY_DATE_OF_BIRTH, KEY_GENDER, KEY_HEIGHT, KEY_WEIGHT,
};
use fitcore_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fitcore")]
#[command(about = "Daily calorie budget and meal ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Load configuration from this file instead of the default path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's budget, consumed and remaining calories (default)
    Status,

    /// Show or edit the biometric profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show the daily budget computed from the profile
    Budget,

    /// Log a meal against today's budget
    Log {
        /// Meal type (breakfast, lunch, dinner, or any label)
        #[arg(long, default_value = "snack")]
        meal: String,

        /// Calories entered manually
        #[arg(long, conflicts_with = "food_json", required_unless_present = "food_json")]
        calories: Option<f64>,

        /// Saved nutrition search response to take the calories from
        #[arg(long)]
        food_json: Option<PathBuf>,

        /// Food name searched for (used for log output only)
        #[arg(long, requires = "food_json")]
        query: Option<String>,
    },

    /// List today's meals
    Meals,

    /// Delete a logged meal and re-derive today's total
    DeleteMeal {
        id: Uuid,
    },

    /// Apply the day boundary (what a midnight timer would trigger)
    Rollover,

    /// Show archived daily totals
    History {
        /// Show the current week, Monday through Sunday, including today
        #[arg(long)]
        week: bool,
    },

    /// Show calories burned for a step count
    Steps {
        count: u32,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the stored profile
    Show,

    /// Update one or more profile fields
    Set {
        /// Date of birth (MM/DD/YYYY or YYYY-MM-DD)
        #[arg(long)]
        dob: Option<String>,

        /// Male, Female or Other
        #[arg(long)]
        sex: Option<String>,

        /// Height, e.g. "182 cm"
        #[arg(long)]
        height: Option<String>,

        /// Weight, e.g. "78 kg"
        #[arg(long)]
        weight: Option<String>,

        /// Not active, Moderately active or Extremely active
        #[arg(long)]
        activity: Option<String>,
    },
}

/// Files under the data directory
struct DataPaths {
    profile: PathBuf,
    snapshot: PathBuf,
    meals: PathBuf,
    history: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let ledger_dir = data_dir.join("ledger");
        Self {
            profile: data_dir.join("profile.json"),
            snapshot: ledger_dir.join("snapshot.json"),
            meals: ledger_dir.join("meals.jsonl"),
            history: data_dir.join("history.csv"),
        }
    }
}

fn main() {
    fitcore_core::logging::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        if let Error::OverBudget { .. } = e {
            eprintln!("You cannot exceed your allowance for today.");
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let today = cli.today.unwrap_or_else(local_today);
    let paths = DataPaths::new(&data_dir);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => cmd_status(&paths, &config, today),
        Commands::Profile { action } => cmd_profile(&paths, &config, today, action),
        Commands::Budget => cmd_budget(&paths, &config, today),
        Commands::Log {
            meal,
            calories,
            food_json,
            query,
        } => cmd_log(&paths, &config, today, &meal, calories, food_json, query),
        Commands::Meals => cmd_meals(&paths, &config, today),
        Commands::DeleteMeal { id } => cmd_delete_meal(&paths, &config, today, id),
        Commands::Rollover => cmd_rollover(&paths, &config, today),
        Commands::History { week } => cmd_history(&paths, &config, today, week),
        Commands::Steps { count } => cmd_steps(&config, count),
    }
}

/// Rebuild the ledger from disk, as of the last persisted day
///
/// The snapshot is authoritative for its day. Without one, the total is
/// re-derived from the meal log.
fn open_ledger(paths: &DataPaths, config: &Config, today: NaiveDate) -> Result<CalorieLedger> {
    let profile = UserProfile::from_document(&load_profile(&paths.profile)?);
    let log = MealLog::new(&paths.meals);

    let (day, consumed) = match LedgerSnapshot::load(&paths.snapshot)? {
        Some(snapshot) if snapshot.day <= today => (snapshot.day, snapshot.consumed),
        Some(snapshot) => {
            tracing::warn!(
                "Snapshot is for {} which is after {}; rebuilding from meal log",
                snapshot.day,
                today
            );
            (today, log.total_for_day(today)?)
        }
        None => (today, log.total_for_day(today)?),
    };

    let mut ledger = CalorieLedger::new(
        profile,
        day,
        config.budget.default_kcal,
        Box::new(SnapshotSink::new(&paths.snapshot)),
    );
    ledger.set_consumed(consumed)?;
    Ok(ledger)
}

/// Roll the ledger forward to `today`, archiving earlier meals
fn catch_up(ledger: &mut CalorieLedger, paths: &DataPaths, today: NaiveDate) -> Result<bool> {
    let mut boundary = DayBoundary::new(ledger.day());
    let Some(new_day) = boundary.observe(today) else {
        return Ok(false);
    };

    let rolled = ledger.rollover(new_day);
    if rolled {
        archive_days_before(&MealLog::new(&paths.meals), &paths.history, new_day)?;
    }
    Ok(rolled)
}

fn open_current_ledger(
    paths: &DataPaths,
    config: &Config,
    today: NaiveDate,
) -> Result<CalorieLedger> {
    let mut ledger = open_ledger(paths, config, today)?;
    catch_up(&mut ledger, paths, today)?;
    Ok(ledger)
}

fn cmd_status(paths: &DataPaths, config: &Config, today: NaiveDate) -> Result<()> {
    let ledger = open_current_ledger(paths, config, today)?;
    display_ledger(&ledger);

    let until_reset = duration_until_next_midnight(&Local::now());
    println!(
        "  Resets in: {}h {:02}m",
        until_reset.num_hours(),
        until_reset.num_minutes() % 60
    );
    Ok(())
}

fn cmd_profile(
    paths: &DataPaths,
    config: &Config,
    today: NaiveDate,
    action: ProfileAction,
) -> Result<()> {
    let mut doc = load_profile(&paths.profile)?;

    match action {
        ProfileAction::Show => {
            let profile = UserProfile::from_document(&doc);
            display_profile(&profile);
        }
        ProfileAction::Set {
            dob,
            sex,
            height,
            weight,
            activity,
        } => {
            let mut ledger = open_current_ledger(paths, config, today)?;

            let updates = [
                (KEY_DATE_OF_BIRTH, dob),
                (KEY_GENDER, sex),
                (KEY_HEIGHT, height),
                (KEY_WEIGHT, weight),
                (KEY_ACTIVITY_LEVEL, activity),
            ];
            for (key, value) in updates {
                if let Some(value) = value {
                    doc.set(key, value);
                }
            }
            save_profile(&paths.profile, &doc)?;

            // Profile edits apply to today's budget immediately
            ledger.update_profile(UserProfile::from_document(&doc));

            println!("✓ Profile saved");
            display_profile(ledger.profile());
            display_ledger(&ledger);
        }
    }

    Ok(())
}

fn cmd_budget(paths: &DataPaths, config: &Config, today: NaiveDate) -> Result<()> {
    let profile = UserProfile::from_document(&load_profile(&paths.profile)?);
    let estimate = estimate_daily_budget(&profile, today, config.budget.default_kcal);

    println!("Daily budget: {:.0} kcal", estimate.kcal);
    if let Some(reason) = estimate.fallback {
        println!("  (default budget used: {})", reason);
    }
    Ok(())
}

fn cmd_log(
    paths: &DataPaths,
    config: &Config,
    today: NaiveDate,
    meal: &str,
    calories: Option<f64>,
    food_json: Option<PathBuf>,
    query: Option<String>,
) -> Result<()> {
    let mut ledger = open_current_ledger(paths, config, today)?;
    let meal_type = MealType::parse(meal);

    let entry = match (calories, food_json) {
        (Some(calories), _) => MealEntry::new(ledger.day(), calories, meal_type),
        (None, Some(path)) => {
            let lookup = SavedResponseLookup::new(path);
            let query = query.unwrap_or_else(|| meal_type.to_string());
            lookup.lookup(&query)?.into_meal_entry(ledger.day(), meal_type)
        }
        (None, None) => {
            return Err(Error::InvalidInput(
                "either --calories or --food-json is required".into(),
            ))
        }
    };

    // Log first so the snapshot never counts a meal the log doesn't have
    ledger.check_entry(&entry)?;
    MealLog::new(&paths.meals).append(&entry)?;
    ledger.record_entry(&entry)?;

    println!(
        "✓ Logged {} {:.0} kcal{}",
        entry.meal_type,
        entry.calories,
        entry
            .food_label
            .as_deref()
            .map(|l| format!(" ({})", l))
            .unwrap_or_default()
    );
    display_ledger(&ledger);
    Ok(())
}

fn cmd_meals(paths: &DataPaths, config: &Config, today: NaiveDate) -> Result<()> {
    let ledger = open_current_ledger(paths, config, today)?;
    let meals = MealLog::new(&paths.meals).meals_for_day(ledger.day())?;

    if meals.is_empty() {
        println!("No meals logged for {}.", ledger.day());
        return Ok(());
    }

    for meal in meals {
        println!(
            "{}  {:<10} {:>6.0} kcal  {}",
            meal.id,
            meal.meal_type.to_string(),
            meal.calories,
            meal.food_label.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn cmd_delete_meal(paths: &DataPaths, config: &Config, today: NaiveDate, id: Uuid) -> Result<()> {
    let mut ledger = open_current_ledger(paths, config, today)?;
    let log = MealLog::new(&paths.meals);

    let removed = log.remove_meal(id)?;
    let total = log.total_for_day(ledger.day())?;
    ledger.set_consumed(total)?;
    LedgerSnapshot {
        day: ledger.day(),
        consumed: ledger.consumed(),
    }
    .save(&paths.snapshot)?;

    println!(
        "✓ Deleted {} ({:.0} kcal)",
        removed.meal_type, removed.calories
    );
    display_ledger(&ledger);
    Ok(())
}

fn cmd_rollover(paths: &DataPaths, config: &Config, today: NaiveDate) -> Result<()> {
    let mut ledger = open_ledger(paths, config, today)?;
    let previous = ledger.day();

    if catch_up(&mut ledger, paths, today)? {
        println!("✓ Rolled over from {} to {}", previous, ledger.day());
    } else {
        println!("Already on {} - nothing to roll over.", ledger.day());
    }
    display_ledger(&ledger);
    Ok(())
}

fn cmd_history(paths: &DataPaths, config: &Config, today: NaiveDate, week: bool) -> Result<()> {
    let totals = daily_totals(&paths.history)?;

    if week {
        let ledger = open_current_ledger(paths, config, today)?;
        for day in week_starting_monday(today) {
            let consumed = if day == ledger.day() {
                ledger.consumed()
            } else {
                totals.get(&day).copied().unwrap_or(0.0)
            };
            println!("{} {}  {:>6.0} kcal", day, day.format("%a"), consumed);
        }
        return Ok(());
    }

    if totals.is_empty() {
        println!("No archived days yet.");
        return Ok(());
    }

    for (day, total) in totals {
        println!("{}  {:>6.0} kcal", day, total);
    }
    Ok(())
}

fn cmd_steps(config: &Config, count: u32) -> Result<()> {
    let summary = StepSummary::for_day(count, &config.steps);

    println!("Steps: {}", summary.steps);
    println!(
        "Burned: {:.2} kcal ({:.0}% of {:.0} kcal goal)",
        summary.burned_kcal,
        summary.burn_progress * 100.0,
        config.steps.daily_burn_goal_kcal
    );
    println!(
        "Step goal: {:.0}% ({} to go)",
        summary.step_progress * 100.0,
        summary.steps_remaining
    );
    Ok(())
}

fn display_ledger(ledger: &CalorieLedger) {
    println!();
    println!("  Day:       {}", ledger.day());
    println!(
        "  Budget:    {:.0} kcal{}",
        ledger.budget(),
        if ledger.is_fallback_budget() {
            " (default)"
        } else {
            ""
        }
    );
    println!("  Consumed:  {:.0} kcal", ledger.consumed());
    println!("  Remaining: {:.0} kcal", ledger.remaining());
}

fn display_profile(profile: &UserProfile) {
    let or_missing = |v: Option<String>| v.unwrap_or_else(|| "(missing)".into());

    println!(
        "  Date of birth:  {}",
        or_missing(profile.date_of_birth.map(|d| d.to_string()))
    );
    println!("  Sex:            {}", profile.sex.label());
    println!(
        "  Height:         {}",
        or_missing(profile.height_cm.map(|h| format!("{} cm", h)))
    );
    println!(
        "  Weight:         {}",
        or_missing(profile.weight_kg.map(|w| format!("{} kg", w)))
    );
    println!("  Activity level: {}", profile.activity_level.label());
}
