use serde::{Deserialize, Serialize};

use super::CategoryRef;

/// Join row from `staff_categories` with the category embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffCategoryLink {
    pub category: Option<CategoryRef>,
}

/// `staff` row with its category assignments embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default = "super::default_true")]
    pub active: bool,
    #[serde(default)]
    pub staff_categories: Vec<StaffCategoryLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffWithCategories {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    /// As entered, trimmed; blank numbers become `None`.
    pub phone: Option<String>,
    pub active: bool,
    /// Sorted by name, without duplicates.
    pub categories: Vec<CategoryRef>,
}

impl From<StaffRow> for StaffWithCategories {
    fn from(row: StaffRow) -> Self {
        let mut categories: Vec<CategoryRef> = row
            .staff_categories
            .into_iter()
            .filter_map(|link| link.category)
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        categories.dedup_by_key(|c| c.id);

        Self {
            full_name: format!("{} {}", row.first_name, row.last_name),
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role,
            email: row.email,
            phone: row.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()).map(String::from),
            active: row.active,
            categories,
        }
    }
}
