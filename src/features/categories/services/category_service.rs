use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::TicketCategory;
use crate::features::categories::repositories::CategoryRepository;

/// Service for the ticket category taxonomy
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    /// List all active categories
    pub async fn list(&self) -> Result<Vec<TicketCategory>> {
        self.categories.list_active().await
    }

    /// Resolve an active category by slug.
    ///
    /// Missing and inactive categories are both reported as invalid input,
    /// since the slug comes from the ticket payload.
    pub async fn require_active(&self, slug: &str) -> Result<TicketCategory> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(AppError::Validation("Category is required".to_string()));
        }

        self.categories
            .find_active_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Invalid category '{}'", slug)))
    }
}
