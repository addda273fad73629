//! Meal-generation orchestration core.
//!
//! The embedding application owns HTTP routing, auth and the relational
//! schema; this crate owns everything between "user pressed generate" and
//! "meals are in the store": context building, the LLM call with retry and
//! backoff, JSON repair, recipe validation, progress tracking and the
//! storage adapter boundary.

pub mod config;
pub mod demographics;
pub mod error;
pub mod generation;
pub mod jobs;
pub mod llm;
pub mod meals;
pub mod plan;
pub mod storage;
pub mod telemetry;
