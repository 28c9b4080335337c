use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub state: TaskState,
    pub date: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Done,
    Deleted,
}

impl TaskState {
    pub const ALL: [TaskState; 3] = [TaskState::Pending, TaskState::Done, TaskState::Deleted];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Deleted => "deleted",
        }
    }

    /// Exact match only; anything else is not a state.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// User intents that rewrite a task's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Complete,
    Delete,
    Reopen,
    /// Brings a deleted task back as done.
    Restore,
}

impl Transition {
    pub fn target(self) -> TaskState {
        match self {
            Self::Complete => TaskState::Done,
            Self::Delete => TaskState::Deleted,
            Self::Reopen => TaskState::Pending,
            Self::Restore => TaskState::Done,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Delete => "delete",
            Self::Reopen => "reopen",
            Self::Restore => "restore",
        }
    }

    /// Transitions a task in `state` can offer, in display order.
    pub fn available_from(state: TaskState) -> &'static [Transition] {
        match state {
            TaskState::Pending => &[Transition::Complete, Transition::Delete],
            TaskState::Done => &[Transition::Reopen, Transition::Delete],
            TaskState::Deleted => &[Transition::Reopen, Transition::Restore],
        }
    }
}
