use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AgendaFault;

/// A single food item inside a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub name: String,
    /// Calories contributed by this item. Non-negative.
    pub calories: f64,
}

/// A logged meal: an ordered list of food items eaten at one moment.
///
/// Owned by the remote store; local copies are read-only projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    pub id: String,
    pub eaten_at: DateTime<Utc>,
    pub meal: Vec<FoodItem>,
}

/// The per-day goal document. At most one exists per (user, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGoalRecord {
    /// None until the document is first created on the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_calories: Option<f64>,
}

/// The authenticated user as seen by this engine, supplied by the external
/// session collaborator at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub default_goal_calories: f64,
}

/// Immutable snapshot handed to the presentation layer.
///
/// Recomputed wholesale on every applied update; never patched in place.
/// `meals_by_date` always contains the selected day's key, with an empty
/// list when that day has no meals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaViewModel {
    /// Day key ("YYYY-MM-DD") to meals for that day, in delivery order.
    pub meals_by_date: HashMap<String, Vec<MealRecord>>,
    pub resolved_goal_calories: f64,
    /// True while either record stream is still loading its snapshot.
    pub is_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<AgendaFault>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_record_accepts_store_document_shape() {
        let json = r#"{
            "id": "m1",
            "eatenAt": "2024-05-01T08:00:00Z",
            "meal": [{ "name": "Oatmeal", "calories": 300.0 }]
        }"#;
        let record: MealRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "m1");
        assert_eq!(record.meal.len(), 1);
        assert_eq!(record.meal[0].calories, 300.0);
    }

    #[test]
    fn test_day_goal_record_without_id_or_goal() {
        let json = r#"{ "date": "2024-05-01" }"#;
        let record: DayGoalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.goal_calories, None);
    }

    #[test]
    fn test_day_goal_record_round_trip_uses_camel_case() {
        let record = DayGoalRecord {
            id: Some("d1".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            goal_calories: Some(2000.0),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("goalCalories"));
        let back: DayGoalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_user_profile_camel_case() {
        let json = r#"{ "uid": "u1", "defaultGoalCalories": 1800.0 }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.default_goal_calories, 1800.0);
    }
}
