use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CategoryRef;

/// `players` row with its category embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub position: Option<String>,
    pub jersey_number: Option<i32>,
    #[serde(default = "super::default_true")]
    pub active: bool,
    pub category_id: Option<i64>,
    pub category: Option<CategoryRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerWithCategory {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    /// Whole years on the day the row was fetched.
    pub age: Option<u32>,
    pub position: Option<String>,
    pub jersey_number: Option<i32>,
    pub active: bool,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
}

impl PlayerRow {
    pub fn into_shaped(self, today: NaiveDate) -> PlayerWithCategory {
        let age = self.birth_date.and_then(|born| today.years_since(born));
        let category_id = self.category_id.or(self.category.as_ref().map(|c| c.id));
        PlayerWithCategory {
            full_name: format!("{} {}", self.first_name, self.last_name),
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            birth_date: self.birth_date,
            age,
            position: self.position,
            jersey_number: self.jersey_number,
            active: self.active,
            category_id,
            category_name: self.category.map(|c| c.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_shapes_joined_row() {
        let row: PlayerRow = serde_json::from_value(json!({
            "id": 11,
            "first_name": "Ana",
            "last_name": "Silva",
            "birth_date": "2012-06-15",
            "position": "GK",
            "jersey_number": 1,
            "category_id": 4,
            "category": {"id": 4, "name": "U12"}
        }))
        .unwrap();

        let player = row.into_shaped(date(2024, 6, 14));
        assert_eq!(player.full_name, "Ana Silva");
        assert_eq!(player.category_name.as_deref(), Some("U12"));
        assert_eq!(player.age, Some(11));
        assert!(player.active);
    }

    #[test]
    fn test_age_turns_on_birthday() {
        let row: PlayerRow = serde_json::from_value(json!({
            "id": 1, "first_name": "A", "last_name": "B",
            "birth_date": "2012-06-15", "position": null, "jersey_number": null,
            "category_id": null, "category": null
        }))
        .unwrap();
        assert_eq!(row.into_shaped(date(2024, 6, 15)).age, Some(12));
    }

    #[test]
    fn test_missing_category_and_birth_date() {
        let row: PlayerRow = serde_json::from_value(json!({
            "id": 2, "first_name": "Leo", "last_name": "Costa",
            "birth_date": null, "position": null, "jersey_number": null,
            "active": false, "category_id": null, "category": null
        }))
        .unwrap();
        let player = row.into_shaped(date(2024, 1, 1));
        assert_eq!(player.age, None);
        assert_eq!(player.category_id, None);
        assert_eq!(player.category_name, None);
        assert!(!player.active);
    }
}
