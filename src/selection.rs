//! Date selection and scope tokens.
//!
//! The controller owns the currently selected date and the monotonic scope
//! token that tags every asynchronous result. Selecting a new date bumps
//! the token; anything arriving tagged with an older token is stale and is
//! dropped at the point of application, not at the transport.

use chrono::NaiveDate;

/// Monotonically increasing identifier for the active date scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScopeToken(u64);

impl ScopeToken {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns the selected date and decides when the record streams restart.
#[derive(Debug)]
pub struct DateSelectionController {
    current: NaiveDate,
    scope: ScopeToken,
}

impl DateSelectionController {
    pub fn new(initial: NaiveDate) -> Self {
        Self {
            current: initial,
            scope: ScopeToken(0),
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current
    }

    pub fn scope(&self) -> ScopeToken {
        self.scope
    }

    /// Select a date. Returns the new scope token when the selection
    /// changed, None when the date is already current (no teardown, no
    /// restart).
    pub fn select(&mut self, date: NaiveDate) -> Option<ScopeToken> {
        if date == self.current {
            return None;
        }
        self.current = date;
        self.scope = self.scope.next();
        Some(self.scope)
    }

    /// True when an event tagged with `token` belongs to the active scope.
    pub fn is_current(&self, token: ScopeToken) -> bool {
        token == self.scope
    }
}

/// date >= the start of the current day.
pub fn is_today_or_future(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today
}
