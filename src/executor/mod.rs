//! Executor: bound statements against catalog + storage

pub mod executor;

pub use executor::{ExecutionResult, Executor};
