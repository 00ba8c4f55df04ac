//! Pure aggregation over meal and goal records.
//!
//! No I/O, no state. Every function derives its value from the collections
//! it is handed; the engine recomputes through these on every update.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::selection::is_today_or_future;
use crate::types::{DayGoalRecord, MealRecord};

/// Day key ("YYYY-MM-DD") for a timestamp in the given timezone.
pub fn day_key(ts: DateTime<Utc>, tz: &Tz) -> String {
    ts.with_timezone(tz).format("%Y-%m-%d").to_string()
}

/// Day key for a plain date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Group meals by the day portion of `eaten_at`, preserving delivery order
/// within each day.
pub fn group_by_day(meals: &[MealRecord], tz: &Tz) -> HashMap<String, Vec<MealRecord>> {
    let mut agenda: HashMap<String, Vec<MealRecord>> = HashMap::new();
    for meal in meals {
        agenda
            .entry(day_key(meal.eaten_at, tz))
            .or_default()
            .push(meal.clone());
    }
    agenda
}

/// Group meals for display. The selected day's key is always present,
/// with an empty list when that day has no meals.
pub fn agenda_items(
    meals: &[MealRecord],
    selected: NaiveDate,
    tz: &Tz,
) -> HashMap<String, Vec<MealRecord>> {
    let mut agenda = group_by_day(meals, tz);
    agenda.entry(date_key(selected)).or_default();
    agenda
}

/// Sum of every food item's calories across all meals. 0 for empty input.
pub fn total_calories(meals: &[MealRecord]) -> f64 {
    meals
        .iter()
        .flat_map(|m| &m.meal)
        .map(|item| item.calories)
        .sum()
}

/// Whether two snapshots differ in total calories.
///
/// A render-skip contract for consumers: a false negative only misses a
/// render, never shows wrong data. The records remain the source of truth.
pub fn have_totals_changed(prev: &[MealRecord], next: &[MealRecord]) -> bool {
    total_calories(prev) != total_calories(next)
}

/// Effective goal calories for the selected date.
///
/// An explicit per-day goal always wins, regardless of date. Without one,
/// today and future dates fall back to the user's default; past days
/// resolve to 0 rather than being retroactively assigned today's default.
pub fn resolve_goal_calories(
    day_goal: Option<&DayGoalRecord>,
    selected: NaiveDate,
    today: NaiveDate,
    default_goal: f64,
) -> f64 {
    if let Some(goal) = day_goal.and_then(|g| g.goal_calories) {
        return goal;
    }
    if is_today_or_future(selected, today) {
        default_goal
    } else {
        0.0
    }
}

/// Timestamp for a meal logged against the selected date: the current
/// instant when the selected date is today, otherwise the start of that
/// day in the given timezone.
pub fn new_meal_eaten_at(selected: NaiveDate, now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    if now.with_timezone(tz).date_naive() == selected {
        return now;
    }
    let midnight = selected.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        // Midnight skipped by a DST transition; fall back to UTC midnight.
        None => Utc.from_utc_datetime(&midnight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FoodItem;

    fn make_meal(id: &str, eaten_at: &str, calories: &[f64]) -> MealRecord {
        MealRecord {
            id: id.to_string(),
            eaten_at: eaten_at.parse().unwrap(),
            meal: calories
                .iter()
                .enumerate()
                .map(|(i, c)| FoodItem {
                    name: format!("item-{}", i),
                    calories: *c,
                })
                .collect(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_total_calories_sums_every_item() {
        let meals = vec![
            make_meal("1", "2024-05-01T08:00:00Z", &[300.0, 120.0]),
            make_meal("2", "2024-05-01T12:30:00Z", &[550.0]),
        ];
        assert_eq!(total_calories(&meals), 970.0);
    }

    #[test]
    fn test_total_calories_empty_is_zero() {
        assert_eq!(total_calories(&[]), 0.0);
    }

    #[test]
    fn test_group_by_day_single_meal() {
        let meals = vec![make_meal("1", "2024-05-01T08:00:00Z", &[300.0])];
        let agenda = group_by_day(&meals, &chrono_tz::UTC);
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda["2024-05-01"].len(), 1);
        assert_eq!(agenda["2024-05-01"][0].id, "1");
        assert_eq!(total_calories(&agenda["2024-05-01"]), 300.0);
    }

    #[test]
    fn test_group_by_day_preserves_delivery_order() {
        let meals = vec![
            make_meal("late", "2024-05-01T20:00:00Z", &[100.0]),
            make_meal("early", "2024-05-01T06:00:00Z", &[200.0]),
        ];
        let agenda = group_by_day(&meals, &chrono_tz::UTC);
        let ids: Vec<&str> = agenda["2024-05-01"].iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "early"]);
    }

    #[test]
    fn test_group_by_day_uses_local_day() {
        // 02:00 UTC on May 2 is still May 1 in New York.
        let meals = vec![make_meal("1", "2024-05-02T02:00:00Z", &[300.0])];
        let agenda = group_by_day(&meals, &chrono_tz::America::New_York);
        assert!(agenda.contains_key("2024-05-01"));
        assert!(!agenda.contains_key("2024-05-02"));
    }

    #[test]
    fn test_agenda_items_always_contains_selected_day() {
        let agenda = agenda_items(&[], date(2024, 5, 1), &chrono_tz::UTC);
        assert_eq!(agenda["2024-05-01"], Vec::<MealRecord>::new());
    }

    #[test]
    fn test_have_totals_changed_reflexive_no_change() {
        let meals = vec![make_meal("1", "2024-05-01T08:00:00Z", &[300.0])];
        assert!(!have_totals_changed(&meals, &meals));
    }

    #[test]
    fn test_have_totals_changed_detects_difference() {
        let prev = vec![make_meal("1", "2024-05-01T08:00:00Z", &[300.0])];
        let next = vec![make_meal("1", "2024-05-01T08:00:00Z", &[450.0])];
        assert!(have_totals_changed(&prev, &next));
    }

    #[test]
    fn test_explicit_goal_always_wins() {
        let goal = DayGoalRecord {
            id: Some("d1".to_string()),
            date: date(2024, 5, 1),
            goal_calories: Some(2000.0),
        };
        // A past date with an explicit goal resolves to it, not to 0.
        assert_eq!(
            resolve_goal_calories(Some(&goal), date(2024, 5, 1), date(2024, 6, 15), 1800.0),
            2000.0
        );
        // Same for a future date.
        assert_eq!(
            resolve_goal_calories(Some(&goal), date(2024, 7, 1), date(2024, 6, 15), 1800.0),
            2000.0
        );
    }

    #[test]
    fn test_no_goal_today_or_future_uses_default() {
        assert_eq!(
            resolve_goal_calories(None, date(2024, 6, 15), date(2024, 6, 15), 1800.0),
            1800.0
        );
        assert_eq!(
            resolve_goal_calories(None, date(2024, 6, 16), date(2024, 6, 15), 1800.0),
            1800.0
        );
    }

    #[test]
    fn test_no_goal_past_date_resolves_to_zero() {
        assert_eq!(
            resolve_goal_calories(None, date(2024, 6, 14), date(2024, 6, 15), 1800.0),
            0.0
        );
    }

    #[test]
    fn test_goal_record_without_calories_falls_through() {
        let goal = DayGoalRecord {
            id: Some("d1".to_string()),
            date: date(2024, 6, 14),
            goal_calories: None,
        };
        assert_eq!(
            resolve_goal_calories(Some(&goal), date(2024, 6, 14), date(2024, 6, 15), 1800.0),
            0.0
        );
    }

    #[test]
    fn test_new_meal_eaten_at_today_is_now() {
        let tz = chrono_tz::UTC;
        let now: DateTime<Utc> = "2024-05-01T14:30:00Z".parse().unwrap();
        assert_eq!(new_meal_eaten_at(date(2024, 5, 1), now, &tz), now);
    }

    #[test]
    fn test_new_meal_eaten_at_other_day_is_start_of_day() {
        let tz = chrono_tz::America::New_York;
        let now: DateTime<Utc> = "2024-05-10T14:30:00Z".parse().unwrap();
        let eaten_at = new_meal_eaten_at(date(2024, 5, 1), now, &tz);
        // Midnight New York on May 1 is 04:00 UTC.
        assert_eq!(eaten_at, "2024-05-01T04:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }
}
