//! The agenda engine: one task, one event queue, one output slot.
//!
//! All mutable state lives inside the engine task. Synchronizer events,
//! mutation outcomes, and user intents arrive on a single mpsc queue in
//! arrival order; every applied event triggers a full view model
//! recomputation published through a watch channel. Events tagged with a
//! superseded scope token are dropped at this boundary. The monotonic
//! scope token is the sole concurrency-control primitive; no locks.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::sync::{mpsc, watch};

use crate::assembler::{self, ViewModelAssembler};
use crate::config::AgendaConfig;
use crate::error::{AgendaError, AgendaFault, StreamKind};
use crate::mutation::{self, MutationGateway};
use crate::selection::{DateSelectionController, ScopeToken};
use crate::store::AgendaStore;
use crate::sync::{DocumentSynchronizer, SyncEvent};
use crate::types::{AgendaViewModel, DayGoalRecord, MealRecord, UserProfile};

/// A user intent emitted by the presentation boundary.
#[derive(Debug, Clone)]
pub enum AgendaIntent {
    /// Switch the agenda to a day-granularity date. Idempotent for the
    /// currently selected date.
    SelectDate(NaiveDate),
    /// Delete a meal on the remote store.
    DeleteMeal(String),
    /// Set the selected day's calorie goal from raw user input.
    SetGoal(String),
}

/// A message on the engine's single event queue.
#[derive(Debug)]
pub(crate) enum EngineMsg {
    Sync(SyncEvent),
    Intent(AgendaIntent),
    Fault(AgendaError),
    Shutdown,
}

/// Handle for the presentation boundary: intents in, view models out.
#[derive(Clone)]
pub struct AgendaHandle {
    intents: mpsc::Sender<EngineMsg>,
    view: watch::Receiver<AgendaViewModel>,
}

impl AgendaHandle {
    /// The latest published view model.
    pub fn current(&self) -> AgendaViewModel {
        self.view.borrow().clone()
    }

    /// A watch receiver for view model updates.
    pub fn view(&self) -> watch::Receiver<AgendaViewModel> {
        self.view.clone()
    }

    pub async fn select_date(&self, date: NaiveDate) -> Result<(), String> {
        self.send(AgendaIntent::SelectDate(date)).await
    }

    pub async fn request_delete_meal(&self, id: impl Into<String>) -> Result<(), String> {
        self.send(AgendaIntent::DeleteMeal(id.into())).await
    }

    pub async fn request_set_goal(&self, input: impl Into<String>) -> Result<(), String> {
        self.send(AgendaIntent::SetGoal(input.into())).await
    }

    /// Stop the engine task and tear down both subscriptions.
    pub async fn shutdown(&self) -> Result<(), String> {
        self.intents
            .send(EngineMsg::Shutdown)
            .await
            .map_err(|_| "Engine stopped".to_string())
    }

    async fn send(&self, intent: AgendaIntent) -> Result<(), String> {
        self.intents
            .send(EngineMsg::Intent(intent))
            .await
            .map_err(|_| "Engine stopped".to_string())
    }
}

/// The date-scoped synchronization engine.
pub struct AgendaEngine {
    store: Arc<dyn AgendaStore>,
    profile: UserProfile,
    tz: Tz,
    selection: DateSelectionController,
    meals: Vec<MealRecord>,
    goal: Option<DayGoalRecord>,
    meals_loading: bool,
    goal_loading: bool,
    last_error: Option<AgendaFault>,
    meals_sync: Option<DocumentSynchronizer>,
    goal_sync: Option<DocumentSynchronizer>,
    assembler: ViewModelAssembler,
    gateway: MutationGateway,
    events: mpsc::Sender<EngineMsg>,
}

impl AgendaEngine {
    /// Spawn the engine on today's date in the configured timezone.
    ///
    /// Must be called from within a tokio runtime. The engine runs until
    /// `AgendaHandle::shutdown` is called.
    pub fn spawn(
        store: Arc<dyn AgendaStore>,
        profile: UserProfile,
        config: AgendaConfig,
    ) -> AgendaHandle {
        let today = Utc::now().with_timezone(&config.tz()).date_naive();
        Self::spawn_at(store, profile, config, today)
    }

    /// Spawn with an explicit initial date, for callers restoring a
    /// previous selection.
    pub fn spawn_at(
        store: Arc<dyn AgendaStore>,
        profile: UserProfile,
        config: AgendaConfig,
        initial: NaiveDate,
    ) -> AgendaHandle {
        let tz = config.tz();
        let (events, queue) = mpsc::channel(config.event_capacity);

        let today = Utc::now().with_timezone(&tz).date_naive();
        let initial_vm = assembler::assemble(
            &[],
            None,
            initial,
            today,
            profile.default_goal_calories,
            true,
            None,
            &tz,
        );
        let (vm_assembler, view) = ViewModelAssembler::new(initial_vm);

        let gateway =
            MutationGateway::new(Arc::clone(&store), profile.uid.clone(), events.clone());

        let mut engine = AgendaEngine {
            store,
            profile,
            tz,
            selection: DateSelectionController::new(initial),
            meals: Vec::new(),
            goal: None,
            meals_loading: true,
            goal_loading: true,
            last_error: None,
            meals_sync: None,
            goal_sync: None,
            assembler: vm_assembler,
            gateway,
            events: events.clone(),
        };

        tokio::spawn(async move {
            engine.start_streams();
            engine.run(queue).await;
        });

        AgendaHandle {
            intents: events,
            view,
        }
    }

    async fn run(mut self, mut queue: mpsc::Receiver<EngineMsg>) {
        while let Some(msg) = queue.recv().await {
            match msg {
                EngineMsg::Intent(AgendaIntent::SelectDate(date)) => self.handle_select(date),
                EngineMsg::Intent(AgendaIntent::DeleteMeal(id)) => self.gateway.delete_meal(id),
                EngineMsg::Intent(AgendaIntent::SetGoal(input)) => self.handle_set_goal(input),
                EngineMsg::Sync(event) => self.handle_sync(event),
                EngineMsg::Fault(err) => self.record_fault(&err),
                EngineMsg::Shutdown => break,
            }
        }
        self.teardown();
        log::info!("Agenda engine stopped");
    }

    fn start_streams(&mut self) {
        let date = self.selection.current_date();
        let scope = self.selection.scope();
        self.meals_sync = Some(DocumentSynchronizer::start_meals(
            &self.store,
            date,
            &self.profile.uid,
            scope,
            &self.events,
        ));
        self.goal_sync = Some(DocumentSynchronizer::start_goal(
            &self.store,
            date,
            &self.profile.uid,
            scope,
            &self.events,
        ));
    }

    fn teardown(&mut self) {
        if let Some(mut sync) = self.meals_sync.take() {
            sync.cancel();
        }
        if let Some(mut sync) = self.goal_sync.take() {
            sync.cancel();
        }
    }

    fn handle_select(&mut self, date: NaiveDate) {
        let Some(scope) = self.selection.select(date) else {
            log::debug!("Date {} already selected, no restart", date);
            return;
        };
        log::info!("Selecting {} (scope {})", date, scope);

        // Teardown previous streams, reset to empty-but-loading.
        self.teardown();
        self.meals = Vec::new();
        self.goal = None;
        self.meals_loading = true;
        self.goal_loading = true;
        self.last_error = None;
        self.publish();

        self.start_streams();
    }

    fn handle_set_goal(&mut self, input: String) {
        match mutation::parse_goal_input(&input) {
            Ok(goal_calories) => {
                // The id comes from the latest goal record, never a cached
                // copy, so a listener that supplied one first turns this
                // into an update.
                let known_id = self.goal.as_ref().and_then(|g| g.id.clone());
                self.gateway.upsert_goal(
                    self.selection.current_date(),
                    goal_calories,
                    known_id,
                );
            }
            Err(err) => {
                log::warn!("{}", err);
                self.record_fault(&err);
            }
        }
    }

    fn handle_sync(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::MealsSnapshot { scope, result } => {
                if self.is_stale(scope, "meals snapshot") {
                    return;
                }
                self.meals_loading = false;
                match result {
                    Ok(meals) => self.meals = meals,
                    Err(e) => self.fail_meals(AgendaError::TransientFetch {
                        stream: StreamKind::Meals,
                        message: e.to_string(),
                    }),
                }
                self.publish();
            }
            SyncEvent::MealsUpdate { scope, result } => {
                if self.is_stale(scope, "meals update") {
                    return;
                }
                match result {
                    Ok(meals) => self.meals = meals,
                    Err(e) => {
                        self.meals_loading = false;
                        self.fail_meals(AgendaError::Listener {
                            stream: StreamKind::Meals,
                            message: e.to_string(),
                        });
                    }
                }
                self.publish();
            }
            SyncEvent::GoalSnapshot { scope, result } => {
                if self.is_stale(scope, "goal snapshot") {
                    return;
                }
                self.goal_loading = false;
                match result {
                    Ok(goal) => self.goal = goal,
                    Err(e) => self.fail_goal(AgendaError::TransientFetch {
                        stream: StreamKind::Goal,
                        message: e.to_string(),
                    }),
                }
                self.publish();
            }
            SyncEvent::GoalUpdate { scope, result } => {
                if self.is_stale(scope, "goal update") {
                    return;
                }
                match result {
                    Ok(goal) => self.goal = goal,
                    Err(e) => {
                        self.goal_loading = false;
                        self.fail_goal(AgendaError::Listener {
                            stream: StreamKind::Goal,
                            message: e.to_string(),
                        });
                    }
                }
                self.publish();
            }
        }
    }

    fn is_stale(&self, scope: ScopeToken, what: &str) -> bool {
        if self.selection.is_current(scope) {
            return false;
        }
        log::debug!(
            "Dropping stale {} (scope {}, active {})",
            what,
            scope,
            self.selection.scope()
        );
        true
    }

    fn fail_meals(&mut self, err: AgendaError) {
        log::warn!("{}", err);
        self.meals = Vec::new();
        self.last_error = Some(AgendaFault::from(&err));
    }

    fn fail_goal(&mut self, err: AgendaError) {
        log::warn!("{}", err);
        self.goal = None;
        self.last_error = Some(AgendaFault::from(&err));
    }

    fn record_fault(&mut self, err: &AgendaError) {
        self.last_error = Some(AgendaFault::from(err));
        self.publish();
    }

    fn publish(&self) {
        let today = Utc::now().with_timezone(&self.tz).date_naive();
        let vm = assembler::assemble(
            &self.meals,
            self.goal.as_ref(),
            self.selection.current_date(),
            today,
            self.profile.default_goal_calories,
            self.meals_loading || self.goal_loading,
            self.last_error.clone(),
            &self.tz,
        );
        if self.assembler.publish(vm) {
            log::debug!("View model updated");
        }
    }
}
