//! Remote store boundary.
//!
//! The engine consumes the store through this trait only; queries,
//! transport, and persistence format belong to the implementor. Live
//! listeners deliver `Result` so subscription failures surface through the
//! same callback as data.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{DayGoalRecord, MealRecord};

/// Transport-level failure reported by the remote store.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Cancels a live subscription. Cancellation is not guaranteed to be
/// instantaneous; late deliveries are discarded by the engine's scope
/// token check, not by this call.
pub type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Callback invoked on every live update of the meals stream.
pub type MealsListener = Box<dyn Fn(Result<Vec<MealRecord>, StoreError>) + Send + Sync>;

/// Callback invoked on every live update of the day-goal stream.
pub type GoalListener = Box<dyn Fn(Result<Option<DayGoalRecord>, StoreError>) + Send + Sync>;

/// The remote record store for meals and day goals.
///
/// One-shot fetches and live subscriptions are scoped to a (date, user)
/// pair. Mutations are fire-and-observe: their effects are expected to
/// arrive through the live listeners, never through local state writes.
#[async_trait]
pub trait AgendaStore: Send + Sync {
    async fn fetch_meals(
        &self,
        date: NaiveDate,
        user_id: &str,
    ) -> Result<Vec<MealRecord>, StoreError>;

    async fn fetch_day_goal(
        &self,
        date: NaiveDate,
        user_id: &str,
    ) -> Result<Option<DayGoalRecord>, StoreError>;

    fn subscribe_meals(
        &self,
        date: NaiveDate,
        user_id: &str,
        on_change: MealsListener,
    ) -> Unsubscribe;

    fn subscribe_day_goal(
        &self,
        date: NaiveDate,
        user_id: &str,
        on_change: GoalListener,
    ) -> Unsubscribe;

    /// Create the day's goal document. Returns the new document id.
    async fn create_day_goal(
        &self,
        date: NaiveDate,
        goal_calories: f64,
        user_id: &str,
    ) -> Result<String, StoreError>;

    /// Update an existing goal document by id.
    async fn update_day_goal(&self, id: &str, goal_calories: f64) -> Result<(), StoreError>;

    /// Delete a meal by id.
    async fn delete_meal(&self, id: &str) -> Result<(), StoreError>;
}
