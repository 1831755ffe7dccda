//! `providers_index` entity and the `Provider` record handed to consumers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Raw row as stored. Nothing outside the storage layer should see this;
/// convert with `Provider::try_from`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "providers_index")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub city: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub state: Option<String>,
    #[sea_orm(nullable)]
    pub specialties: Option<Vec<String>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A directory listing.
///
/// `specialties` is always present; a NULL array in storage decodes to an
/// empty list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
}

impl Provider {
    /// Case-insensitive substring match against the name or any specialty.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.specialties.iter().any(|s| s.to_lowercase().contains(needle))
    }
}

impl TryFrom<Model> for Provider {
    type Error = ModelError;

    fn try_from(row: Model) -> Result<Self, Self::Error> {
        // An empty id cannot be addressed by a point lookup.
        if row.id.trim().is_empty() {
            return Err(ModelError::Decode("provider id is empty".into()));
        }
        Ok(Provider {
            id: row.id,
            name: row.name,
            city: row.city,
            state: row.state,
            specialties: row.specialties.unwrap_or_default(),
        })
    }
}
