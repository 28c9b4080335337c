use crate::clock::{Clock, format_day};
use crate::error::AppError;
use crate::model::{Task, TaskState, Transition};
use crate::storage::KeyValueStore;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const STORAGE_KEY: &str = "todo_tasks_v1";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub done: usize,
    pub deleted: usize,
}

/// Builds a task from an arbitrary record, or `None` when the record has no
/// usable text. Missing fields fall back to defaults; nothing else is repaired.
pub fn normalize(raw: &Value, index: usize, clock: &dyn Clock) -> Option<Task> {
    let text = raw.get("text").and_then(Value::as_str).map(str::trim)?;
    if text.is_empty() {
        return None;
    }

    let state = raw
        .get("state")
        .and_then(Value::as_str)
        .and_then(TaskState::parse)
        .unwrap_or(TaskState::Pending);
    let date = match raw.get("date").and_then(Value::as_str) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => format_day(clock.today()),
    };
    let id = raw.get("id").and_then(stored_id).unwrap_or_else(synthesize_id);
    let created_at = match raw.get("createdAt") {
        Some(Value::Number(value)) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|millis| millis as i64)),
        _ => None,
    }
    .unwrap_or_else(|| clock.now_millis() + index as i64);

    Some(Task {
        id,
        text: text.to_string(),
        state,
        date,
        created_at,
    })
}

/// Truthy scalar ids are kept as strings; empty strings, zero, `false` and
/// `null` get a fresh id. Objects and arrays have no usable string form.
fn stored_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(number) => match (number.as_i64(), number.as_u64(), number.as_f64()) {
            (Some(0), _, _) => None,
            (Some(int), _, _) => Some(int.to_string()),
            (None, Some(uint), _) => Some(uint.to_string()),
            (None, None, Some(float)) if float == 0.0 || !float.is_finite() => None,
            (None, None, Some(float)) if float.fract() == 0.0 && float.abs() < 1e15 => {
                Some(format!("{}", float as i64))
            }
            (None, None, Some(float)) => Some(float.to_string()),
            (None, None, None) => None,
        },
        _ => None,
    }
}

fn synthesize_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parses a persisted blob. Anything other than a JSON array of records
/// yields an empty list.
pub fn parse_tasks(content: &str, clock: &dyn Clock) -> Vec<Task> {
    let records = match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            warn!("stored tasks are not an array, starting empty");
            return Vec::new();
        }
        Err(err) => {
            warn!(error = %err, "stored tasks are not valid JSON, starting empty");
            return Vec::new();
        }
    };

    let total = records.len();
    let tasks: Vec<Task> = records
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| normalize(raw, index, clock))
        .collect();
    if tasks.len() < total {
        debug!(dropped = total - tasks.len(), "dropped malformed task records");
    }
    tasks
}

/// Sole owner of the task list and the only writer of persisted state.
pub struct TaskStore<S: KeyValueStore> {
    storage: S,
    tasks: Vec<Task>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Reads the persisted list. Read failures fall back to an empty list.
    pub fn load(storage: S, clock: &dyn Clock) -> Self {
        let tasks = match storage.get(STORAGE_KEY) {
            Ok(Some(content)) => parse_tasks(&content, clock),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read stored tasks, starting empty");
                Vec::new()
            }
        };
        debug!(count = tasks.len(), "loaded tasks");

        Self { storage, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn save(&self) -> Result<(), AppError> {
        let content = serde_json::to_string(&self.tasks)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        self.storage.set(STORAGE_KEY, &content)
    }

    /// Prepends a pending task dated today. Blank text adds nothing and
    /// writes nothing.
    ///
    /// A persistence failure is returned after the task is already in memory.
    pub fn add(&mut self, text: &str, clock: &dyn Clock) -> Result<Option<Task>, AppError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let task = Task {
            id: self.fresh_id(),
            text: trimmed.to_string(),
            state: TaskState::Pending,
            date: format_day(clock.today()),
            created_at: clock.now_millis(),
        };

        self.tasks.insert(0, task.clone());
        info!(id = %task.id, "added task");
        self.save()?;

        Ok(Some(task))
    }

    /// Rewrites the task's state and persists. Unknown ids return `None`
    /// without touching storage.
    pub fn transition(
        &mut self,
        id: &str,
        transition: Transition,
    ) -> Result<Option<Task>, AppError> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!(id, transition = transition.name(), "transition on unknown task");
            return Ok(None);
        };

        task.state = transition.target();
        let updated = task.clone();
        info!(id, transition = transition.name(), state = updated.state.as_str(), "task transitioned");
        self.save()?;

        Ok(Some(updated))
    }

    pub fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for task in &self.tasks {
            match task.state {
                TaskState::Pending => counts.pending += 1,
                TaskState::Done => counts.done += 1,
                TaskState::Deleted => counts.deleted += 1,
            }
        }
        counts.total = counts.pending + counts.done + counts.deleted;
        counts
    }

    fn fresh_id(&self) -> String {
        loop {
            let candidate = synthesize_id();
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
