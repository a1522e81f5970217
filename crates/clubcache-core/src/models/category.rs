use serde::{Deserialize, Serialize};

/// Embedded `{id, name}` of a related category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

/// Member row embedded under a category (`players(id,active)`).
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryMemberRow {
    pub id: i64,
    #[serde(default = "super::default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "super::default_true")]
    pub active: bool,
    #[serde(default)]
    pub players: Vec<CategoryMemberRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWithCount {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub player_count: usize,
    pub active_player_count: usize,
}

impl From<CategoryRow> for CategoryWithCount {
    fn from(row: CategoryRow) -> Self {
        let active_player_count = row.players.iter().filter(|p| p.active).count();
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            active: row.active,
            player_count: row.players.len(),
            active_player_count,
        }
    }
}
