//! Per-stream document synchronizers.
//!
//! One synchronizer per record stream (meals-for-date, goal-for-date).
//! Each start issues a one-shot fetch and attaches a live listener; both
//! paths tag their results with the scope token they were started under.
//! Teardown requests transport unsubscription, but the token comparison at
//! the point of application is the actual stale-delivery guard, because
//! unsubscription is not instantaneous.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;

use crate::engine::EngineMsg;
use crate::error::StreamKind;
use crate::selection::ScopeToken;
use crate::store::{AgendaStore, StoreError, Unsubscribe};
use crate::types::{DayGoalRecord, MealRecord};

/// An update flowing from a synchronizer into the engine's event queue.
#[derive(Debug)]
pub enum SyncEvent {
    /// One-shot fetch result for the meals stream.
    MealsSnapshot {
        scope: ScopeToken,
        result: Result<Vec<MealRecord>, StoreError>,
    },
    /// Live listener delivery for the meals stream.
    MealsUpdate {
        scope: ScopeToken,
        result: Result<Vec<MealRecord>, StoreError>,
    },
    /// One-shot fetch result for the day-goal stream.
    GoalSnapshot {
        scope: ScopeToken,
        result: Result<Option<DayGoalRecord>, StoreError>,
    },
    /// Live listener delivery for the day-goal stream.
    GoalUpdate {
        scope: ScopeToken,
        result: Result<Option<DayGoalRecord>, StoreError>,
    },
}

/// Owns one subscription lifecycle: fetch-then-listen, replaced on date
/// change, unsubscribed on teardown.
pub struct DocumentSynchronizer {
    stream: StreamKind,
    scope: ScopeToken,
    unsubscribe: Option<Unsubscribe>,
}

impl DocumentSynchronizer {
    /// Start the meals-for-date stream under the given scope.
    pub fn start_meals(
        store: &Arc<dyn AgendaStore>,
        date: NaiveDate,
        user_id: &str,
        scope: ScopeToken,
        events: &mpsc::Sender<EngineMsg>,
    ) -> Self {
        let fetch_store = Arc::clone(store);
        let fetch_tx = events.clone();
        let fetch_uid = user_id.to_string();
        tokio::spawn(async move {
            let result = fetch_store.fetch_meals(date, &fetch_uid).await;
            let event = EngineMsg::Sync(SyncEvent::MealsSnapshot { scope, result });
            if fetch_tx.send(event).await.is_err() {
                log::debug!("Meals snapshot for {} discarded, engine stopped", date);
            }
        });

        let listen_tx = events.clone();
        let unsubscribe = store.subscribe_meals(
            date,
            user_id,
            Box::new(move |result| {
                let event = EngineMsg::Sync(SyncEvent::MealsUpdate { scope, result });
                if let Err(e) = listen_tx.try_send(event) {
                    log::warn!("Meals update for {} dropped: {}", date, e);
                }
            }),
        );

        log::info!("Meals stream started for {} (scope {})", date, scope);
        Self {
            stream: StreamKind::Meals,
            scope,
            unsubscribe: Some(unsubscribe),
        }
    }

    /// Start the goal-for-date stream under the given scope.
    pub fn start_goal(
        store: &Arc<dyn AgendaStore>,
        date: NaiveDate,
        user_id: &str,
        scope: ScopeToken,
        events: &mpsc::Sender<EngineMsg>,
    ) -> Self {
        let fetch_store = Arc::clone(store);
        let fetch_tx = events.clone();
        let fetch_uid = user_id.to_string();
        tokio::spawn(async move {
            let result = fetch_store.fetch_day_goal(date, &fetch_uid).await;
            let event = EngineMsg::Sync(SyncEvent::GoalSnapshot { scope, result });
            if fetch_tx.send(event).await.is_err() {
                log::debug!("Goal snapshot for {} discarded, engine stopped", date);
            }
        });

        let listen_tx = events.clone();
        let unsubscribe = store.subscribe_day_goal(
            date,
            user_id,
            Box::new(move |result| {
                let event = EngineMsg::Sync(SyncEvent::GoalUpdate { scope, result });
                if let Err(e) = listen_tx.try_send(event) {
                    log::warn!("Goal update for {} dropped: {}", date, e);
                }
            }),
        );

        log::info!("Goal stream started for {} (scope {})", date, scope);
        Self {
            stream: StreamKind::Goal,
            scope,
            unsubscribe: Some(unsubscribe),
        }
    }

    /// Tear down the live subscription. Late deliveries remain possible
    /// until the transport honors the request; the engine's scope check
    /// drops them.
    pub fn cancel(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            log::debug!("{} stream cancelled (scope {})", self.stream, self.scope);
            unsubscribe();
        }
    }
}

impl Drop for DocumentSynchronizer {
    fn drop(&mut self) {
        self.cancel();
    }
}
