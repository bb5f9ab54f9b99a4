use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use variantforge_core::{DomainError, DomainResult};

use crate::ids::{BaseProductId, CategoryId};

/// Top-level product grouping one or more variants under a shared name and
/// category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseProduct {
    pub id: BaseProductId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BaseProduct {
    /// Create a new base product stamped at `created_at`.
    pub fn new(
        id: BaseProductId,
        name: impl Into<String>,
        description: Option<String>,
        category_id: Option<CategoryId>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("base product name cannot be empty"));
        }

        Ok(Self {
            id,
            name,
            description,
            category_id,
            created_at,
            updated_at: created_at,
        })
    }
}
