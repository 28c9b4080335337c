use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,

    /// Only consider tasks dated on this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", global = true, conflicts_with = "last")]
    pub date: Option<String>,

    /// Only consider tasks from the last N days, today included
    #[arg(long, value_name = "DAYS", global = true)]
    pub last: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new pending task dated today
    ///
    /// Example: tasklog add "Write spec"
    Add { text: Option<String> },
    /// Mark a task as done
    ///
    /// Example: tasklog done 6f1c…
    Done { id: String },
    /// Move a task to the deleted list
    ///
    /// Example: tasklog delete 6f1c…
    Delete { id: String },
    /// Move a done or deleted task back to pending
    ///
    /// Example: tasklog reopen 6f1c…
    Reopen { id: String },
    /// Recover a deleted task as done
    ///
    /// Example: tasklog restore 6f1c…
    Restore { id: String },
    /// List tasks grouped by day, newest first
    ///
    /// Example: tasklog list pending --last 7
    List {
        #[arg(value_enum, default_value_t = ListState::All)]
        state: ListState,
    },
    /// Show task counts
    ///
    /// Example: tasklog stats
    Stats,
    /// Generate a summary of the filtered range
    ///
    /// Example: tasklog report --last 7
    /// Example: tasklog report --date 2024-06-10 --format html
    Report {
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Copy the report (or the polishing prompt) to the clipboard
    ///
    /// Example: tasklog copy --last 7
    /// Example: tasklog copy --prompt --last 7
    Copy {
        #[arg(long)]
        prompt: bool,
    },
    /// Change the active filter for the rest of an interactive session
    ///
    /// Example: filter last 7
    /// Example: filter date 2024-06-10
    /// Example: filter clear
    Filter {
        #[command(subcommand)]
        filter: FilterCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum FilterCommand {
    /// Show a single day
    Date { date: String },
    /// Show the last N days, today included
    Last { days: u32 },
    /// Show everything
    Clear,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    All,
    Pending,
    Done,
    Deleted,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Prompt,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    QuickFilters,
    PromptPreamble,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "quick_filters" | "quick_filter" | "presets" => ConfigOverrideTarget::QuickFilters,
        "prompt_preamble" | "preamble" => ConfigOverrideTarget::PromptPreamble,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
