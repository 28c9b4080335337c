pub mod clipboard;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod report;
pub mod session;
pub mod storage;
pub mod task_store;
