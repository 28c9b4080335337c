mod filter;
mod task;

pub use filter::{DateRange, Filter};
pub use task::{Task, TaskState, Transition};
