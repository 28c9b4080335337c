use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tabled::{Table, Tabled};
use tasklog_cli::cli::{
    Cli, Command, ConfigOverrideTarget, FilterCommand, ListState, ReportFormat,
    parse_config_override,
};
use tasklog_core::clipboard::SystemClipboard;
use tasklog_core::clock::{Clock, FixedClock, SystemClock, parse_day};
use tasklog_core::config::{
    Config, ConfigOverrides, Palette, load_config_with_fallback, merge_overrides,
    parse_quick_filters,
};
use tasklog_core::error::AppError;
use tasklog_core::filter::{DateGroup, QUICK_FILTER_PLACEHOLDER, format_date};
use tasklog_core::model::{DateRange, Task, TaskState, Transition};
use tasklog_core::session::{CopyOutcome, CopyTarget, Session};
use tasklog_core::storage::JsonFileStore;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const TODAY_ENV_VAR: &str = "TASKLOG_TODAY";
const EMPTY_HINT: &str = "暂无任务";

type AppSession<'a> = Session<JsonFileStore, &'a dyn Clock>;

/// Whether the command found what it was asked to act on.
enum Outcome {
    Done,
    NotFound,
}

struct View {
    palette: Palette,
}

#[derive(Tabled)]
struct CountsRow {
    total: usize,
    pending: usize,
    done: usize,
    deleted: usize,
}

fn init_tracing() {
    // Opt-in through RUST_LOG; a bad filter must not stop the CLI.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn clock_from_env() -> Result<Box<dyn Clock>, AppError> {
    match std::env::var(TODAY_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => {
            let today = parse_day(&value)?;
            Ok(Box::new(FixedClock::new(today, SystemClock.now_millis())))
        }
        _ => Ok(Box::new(SystemClock)),
    }
}

fn load_config() -> Config {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: config ignored: {}", err);
    }
    loaded.config
}

fn apply_overrides(config: &Config, raw: &[String]) -> Result<Config, AppError> {
    if raw.is_empty() {
        return Ok(config.clone());
    }

    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::QuickFilters => {
                overrides.quick_filters = Some(parse_quick_filters(&parsed.value)?)
            }
            ConfigOverrideTarget::PromptPreamble => {
                overrides.prompt_preamble = Some(vec![parsed.value])
            }
        }
    }
    Ok(merge_overrides(config, &overrides))
}

fn state_heading(state: TaskState) -> &'static str {
    match state {
        TaskState::Pending => "Pending",
        TaskState::Done => "Done",
        TaskState::Deleted => "Deleted",
    }
}

fn transition_label(transition: Transition) -> &'static str {
    match transition {
        Transition::Complete => "Completed",
        Transition::Delete => "Deleted",
        Transition::Reopen => "Reopened",
        Transition::Restore => "Restored",
    }
}

fn command_name(transition: Transition) -> &'static str {
    match transition {
        Transition::Complete => "done",
        Transition::Delete => "delete",
        Transition::Reopen => "reopen",
        Transition::Restore => "restore",
    }
}

fn list_states(state: ListState) -> Vec<TaskState> {
    match state {
        ListState::All => TaskState::ALL.to_vec(),
        ListState::Pending => vec![TaskState::Pending],
        ListState::Done => vec![TaskState::Done],
        ListState::Deleted => vec![TaskState::Deleted],
    }
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "text": task.text,
        "state": task.state,
        "date": task.date,
        "createdAt": task.created_at,
    })
}

fn print_task_json(task: &Task) {
    println!("{}", task_json(task));
}

fn print_groups_plain(view: &View, state: TaskState, groups: &[DateGroup]) {
    let actions: Vec<&str> = Transition::available_from(state)
        .iter()
        .map(|transition| command_name(*transition))
        .collect();
    println!(
        "{} {}",
        view.palette.accentize(state_heading(state)),
        view.palette.mutedize(&format!("[{}]", actions.join(" | ")))
    );
    if groups.is_empty() {
        println!("  {}", view.palette.mutedize(EMPTY_HINT));
        return;
    }

    for group in groups {
        println!("  {}", view.palette.accentize(&group.label()));
        for task in &group.tasks {
            println!("    {} | {}", view.palette.mutedize(&task.id), task.text);
        }
    }
}

fn groups_json(groups: &[DateGroup]) -> serde_json::Value {
    let payload: Vec<serde_json::Value> = groups
        .iter()
        .map(|group| {
            serde_json::json!({
                "date": group.date,
                "label": group.label(),
                "tasks": group.tasks.iter().map(task_json).collect::<Vec<_>>(),
            })
        })
        .collect();
    serde_json::Value::Array(payload)
}

fn filter_caption(session: &AppSession<'_>, range: &DateRange) -> String {
    match session.filter().days() {
        Some(_) => session.filter_label(),
        None => format_date(range.start_key()),
    }
}

fn presets_line(session: &AppSession<'_>) -> String {
    let labels: Vec<String> = session
        .quick_filters()
        .into_iter()
        .map(|(_, label)| label)
        .collect();
    labels.join(" | ")
}

fn print_filter(session: &AppSession<'_>, json: bool) {
    let range = session.range();
    if json {
        let presets: Vec<u32> = session.quick_filters().into_iter().map(|(days, _)| days).collect();
        let json = serde_json::json!({
            "active": session.filter().is_active(),
            "filter": session.filter_label(),
            "start": range.as_ref().map(|range| range.start_key().to_string()),
            "end": range.as_ref().map(|range| range.end_key().to_string()),
            "report_label": session.report_button_label(),
            "quick_filters": presets,
        });
        println!("{}", json);
        return;
    }

    match range {
        Some(range) => println!(
            "Filter: {} ({} ~ {})",
            filter_caption(session, &range),
            range.start_key(),
            range.end_key()
        ),
        None => println!("Filter: none"),
    }
    if !session.quick_filters().is_empty() {
        println!("{}: {}", QUICK_FILTER_PLACEHOLDER, presets_line(session));
    }
}

fn apply_filter_flags(session: &mut AppSession<'_>, cli: &Cli) -> Result<(), AppError> {
    if let Some(date) = cli.date.as_deref() {
        session.set_date_filter(date)?;
    } else if let Some(days) = cli.last {
        session.set_quick_filter(days)?;
    }
    Ok(())
}

fn run_transition(
    session: &mut AppSession<'_>,
    id: &str,
    transition: Transition,
    json: bool,
) -> Result<Outcome, AppError> {
    match session.transition(id, transition)? {
        Some(task) => {
            if json {
                print_task_json(&task);
            } else {
                println!("{} task: {} ({})", transition_label(transition), task.text, task.id);
            }
            Ok(Outcome::Done)
        }
        None => {
            eprintln!("Task not found: {}", id.trim());
            Ok(Outcome::NotFound)
        }
    }
}

fn run_command(session: &mut AppSession<'_>, view: &View, cli: Cli) -> Result<Outcome, AppError> {
    apply_filter_flags(session, &cli)?;
    let json = cli.json;

    match cli.command {
        Command::Add { text } => match session.add(text.as_deref().unwrap_or(""))? {
            Some(task) => {
                if json {
                    print_task_json(&task);
                } else {
                    println!("Added task: {} ({})", task.text, task.id);
                }
            }
            None => println!("Nothing to add"),
        },
        Command::Done { id } => return run_transition(session, &id, Transition::Complete, json),
        Command::Delete { id } => return run_transition(session, &id, Transition::Delete, json),
        Command::Reopen { id } => return run_transition(session, &id, Transition::Reopen, json),
        Command::Restore { id } => return run_transition(session, &id, Transition::Restore, json),
        Command::List { state } => {
            let states = list_states(state);
            if json {
                let mut payload = serde_json::Map::new();
                for state in states {
                    payload.insert(
                        state.as_str().to_string(),
                        groups_json(&session.task_groups(state)),
                    );
                }
                println!("{}", serde_json::Value::Object(payload));
            } else {
                for state in states {
                    print_groups_plain(view, state, &session.task_groups(state));
                }
            }
        }
        Command::Stats => {
            let counts = session.counts();
            if json {
                let json = serde_json::json!({
                    "total": counts.total,
                    "pending": counts.pending,
                    "done": counts.done,
                    "deleted": counts.deleted,
                });
                println!("{}", json);
            } else {
                let row = CountsRow {
                    total: counts.total,
                    pending: counts.pending,
                    done: counts.done,
                    deleted: counts.deleted,
                };
                println!("{}", Table::new([row]));
            }
        }
        Command::Report { format } => {
            let report = session.generate_report();
            if json {
                let payload = serde_json::to_string(report)
                    .map_err(|err| AppError::invalid_data(err.to_string()))?;
                println!("{}", payload);
            } else {
                match format {
                    ReportFormat::Text => println!("{}", report.text),
                    ReportFormat::Prompt => println!("{}", report.prompt),
                    ReportFormat::Html => println!("{}", report.html),
                }
            }
        }
        Command::Copy { prompt } => {
            let target = if prompt {
                CopyTarget::Prompt
            } else {
                CopyTarget::Text
            };
            match session.copy_report(target, &SystemClipboard) {
                CopyOutcome::Copied => println!("Copied to clipboard"),
                CopyOutcome::Fallback { text, error } => {
                    warn!(error = %error, "clipboard unavailable, printing instead");
                    eprintln!("Clipboard unavailable, copy the text below");
                    println!("{}", text);
                }
            }
        }
        Command::Filter { filter } => {
            match filter {
                FilterCommand::Date { date } => {
                    session.set_date_filter(&date)?;
                }
                FilterCommand::Last { days } => {
                    session.set_quick_filter(days)?;
                }
                FilterCommand::Clear => {
                    session.clear_filter();
                }
            }
            print_filter(session, json);
        }
    }

    Ok(Outcome::Done)
}

fn is_display_request(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_interactive(session: &mut AppSession<'_>, config: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasklog".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if is_display_request(&err) => {
                println!("{}", err.render());
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        // Overrides on a line apply to that line only.
        let view = match apply_overrides(config, &cli.config_override) {
            Ok(line_config) => {
                session.set_settings(line_config.session_settings());
                View {
                    palette: line_config.palette(),
                }
            }
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if let Err(err) = run_command(session, &view, cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn open_session<'a>(clock: &'a dyn Clock, config: &Config) -> Result<AppSession<'a>, AppError> {
    let storage = JsonFileStore::from_env()?;
    Ok(Session::open(storage, clock, config.session_settings()))
}

fn run() -> Result<Outcome, AppError> {
    let clock = clock_from_env()?;
    let config = load_config();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        let mut session = open_session(clock.as_ref(), &config)?;
        run_interactive(&mut session, &config)?;
        return Ok(Outcome::Done);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if is_display_request(&err) => err.exit(),
        Err(err) => return Err(normalize_parse_error(err)),
    };
    let config = apply_overrides(&config, &cli.config_override)?;
    let view = View {
        palette: config.palette(),
    };
    let mut session = open_session(clock.as_ref(), &config)?;
    run_command(&mut session, &view, cli)
}

fn main() {
    init_tracing();

    match run() {
        Ok(Outcome::Done) => {}
        Ok(Outcome::NotFound) => std::process::exit(1),
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    }
}
