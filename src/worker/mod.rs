//! Runs a [`RunController`](crate::processing::RunController) off the caller's thread.
//!
//! The run itself stays sequential; the worker moves it onto tokio's blocking
//! pool and forwards every notification over a channel.

mod task;
mod error;

pub use task::{RunEvent, RunHandle, spawn_run};
pub use error::{WorkerError, WorkerResult};
