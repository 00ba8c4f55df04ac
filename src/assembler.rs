//! View model assembly.
//!
//! The single recomputation path: every applied update rebuilds the whole
//! AgendaViewModel from the latest stream state. No incremental patching;
//! collections are single-day scope and stay small. Publishing skips view
//! models identical to the last published value.

use chrono::NaiveDate;
use chrono_tz::Tz;
use tokio::sync::watch;

use crate::aggregate;
use crate::error::AgendaFault;
use crate::types::{AgendaViewModel, DayGoalRecord, MealRecord};

/// Build a view model from the latest state of both record streams.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    meals: &[MealRecord],
    goal: Option<&DayGoalRecord>,
    selected: NaiveDate,
    today: NaiveDate,
    default_goal: f64,
    is_loading: bool,
    last_error: Option<AgendaFault>,
    tz: &Tz,
) -> AgendaViewModel {
    AgendaViewModel {
        meals_by_date: aggregate::agenda_items(meals, selected, tz),
        resolved_goal_calories: aggregate::resolve_goal_calories(
            goal,
            selected,
            today,
            default_goal,
        ),
        is_loading,
        last_error,
    }
}

/// Publishes assembled view models into the shared watch slot consumed by
/// the presentation layer.
pub struct ViewModelAssembler {
    output: watch::Sender<AgendaViewModel>,
}

impl ViewModelAssembler {
    pub fn new(initial: AgendaViewModel) -> (Self, watch::Receiver<AgendaViewModel>) {
        let (output, view) = watch::channel(initial);
        (Self { output }, view)
    }

    /// Publish a recomputed view model. Returns false when it is identical
    /// to the last published value and no notification was sent.
    pub fn publish(&self, next: AgendaViewModel) -> bool {
        self.output.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        })
    }
}
