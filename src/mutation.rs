//! Mutation gateway: goal upsert and meal delete.
//!
//! Mutations never write local state. Their effects arrive through the
//! live listeners (the single source of truth); failures are reported
//! back into the engine queue as faults and the view model is left
//! untouched until the store says otherwise.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;

use crate::engine::EngineMsg;
use crate::error::AgendaError;
use crate::store::AgendaStore;

/// Parse and validate raw goal input.
///
/// A goal must be a finite number greater than zero; zero and non-numeric
/// input are rejected before any store call is made.
pub fn parse_goal_input(input: &str) -> Result<f64, AgendaError> {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(AgendaError::Validation(format!(
            "'{}' is not a valid calorie goal",
            input
        ))),
    }
}

/// Issues remote mutations on behalf of the engine.
pub struct MutationGateway {
    store: Arc<dyn AgendaStore>,
    user_id: String,
    events: mpsc::Sender<EngineMsg>,
}

impl MutationGateway {
    pub fn new(
        store: Arc<dyn AgendaStore>,
        user_id: String,
        events: mpsc::Sender<EngineMsg>,
    ) -> Self {
        Self {
            store,
            user_id,
            events,
        }
    }

    /// Best-effort remote delete. On failure, logs and leaves state
    /// untouched; the subsequent listener update (or its absence) is the
    /// only correction. No optimistic local removal.
    pub fn delete_meal(&self, id: String) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match store.delete_meal(&id).await {
                Ok(()) => log::debug!("Deleted meal {}", id),
                Err(e) => log::warn!("Failed to delete meal {}: {}", id, e),
            }
        });
    }

    /// Create or update the day's goal. `known_id` must be re-derived from
    /// the latest goal record at intent time, never cached, so a
    /// concurrent listener update that supplies an identifier first turns
    /// the next call into an update instead of a second create.
    pub fn upsert_goal(&self, date: NaiveDate, goal_calories: f64, known_id: Option<String>) {
        let store = Arc::clone(&self.store);
        let user_id = self.user_id.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match known_id {
                Some(id) => store.update_day_goal(&id, goal_calories).await,
                None => store
                    .create_day_goal(date, goal_calories, &user_id)
                    .await
                    .map(|id| {
                        log::debug!("Created goal {} for {}", id, date);
                    }),
            };

            if let Err(e) = result {
                log::warn!("Failed to save goal for {}: {}", date, e);
                let fault = AgendaError::Mutation(format!("Your goal couldn't be saved: {}", e));
                if events.send(EngineMsg::Fault(fault)).await.is_err() {
                    log::debug!("Goal fault for {} discarded, engine stopped", date);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_goal_input_accepts_positive_numbers() {
        assert_eq!(parse_goal_input("1800").unwrap(), 1800.0);
        assert_eq!(parse_goal_input(" 2200.5 ").unwrap(), 2200.5);
    }

    #[test]
    fn test_parse_goal_input_rejects_zero() {
        assert!(parse_goal_input("0").is_err());
    }

    #[test]
    fn test_parse_goal_input_rejects_non_numeric() {
        assert!(parse_goal_input("abc").is_err());
        assert!(parse_goal_input("").is_err());
        assert!(parse_goal_input("12kcal").is_err());
    }

    #[test]
    fn test_parse_goal_input_rejects_negative_and_non_finite() {
        assert!(parse_goal_input("-100").is_err());
        assert!(parse_goal_input("inf").is_err());
        assert!(parse_goal_input("NaN").is_err());
    }
}
