//! Date-scoped synchronization and aggregation engine for a daily meal
//! log with per-day calorie goals.
//!
//! Given a selected date, the engine fetches an initial snapshot of two
//! independently-changing record streams (meal entries, day goal),
//! attaches live subscriptions for both, merges every update into one
//! immutable [`types::AgendaViewModel`], and tears the streams down when
//! the date changes. Stale asynchronous results are discarded by
//! monotonic scope tokens, so an out-of-order fetch can never overwrite a
//! newer selection's data.
//!
//! The remote store is consumed only through [`store::AgendaStore`];
//! presentation consumes the view model watch channel and emits intents
//! through [`engine::AgendaHandle`].

pub mod aggregate;
mod assembler;
pub mod config;
pub mod engine;
pub mod error;
mod mutation;
pub mod selection;
pub mod store;
mod sync;
pub mod types;

pub use config::AgendaConfig;
pub use engine::{AgendaEngine, AgendaHandle, AgendaIntent};
pub use error::{AgendaError, AgendaFault, FaultKind, StreamKind};
pub use store::{AgendaStore, GoalListener, MealsListener, StoreError, Unsubscribe};
pub use types::{AgendaViewModel, DayGoalRecord, FoodItem, MealRecord, UserProfile};
