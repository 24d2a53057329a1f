//! Domain types representing expense categories.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::common::*;
use crate::errors::LedgerError;
use crate::identity::Identity;

pub const DEFAULT_EMOJI: &str = "💰";
pub const DEFAULT_COLOR: &str = "hsl(152, 60%, 45%)";

/// Categorises expenses for breakdowns and display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub emoji: String,
    pub color: String,
    #[serde(default)]
    pub owner: CategoryOwner,
}

impl Category {
    pub fn shared(
        id: impl Into<String>,
        label: impl Into<String>,
        emoji: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            emoji: emoji.into(),
            color: color.into(),
            owner: CategoryOwner::Shared,
        }
    }

    /// Builds the category `identity` would own for `draft`, deriving its id.
    pub fn owned_by(identity: &Identity, draft: CategoryDraft) -> Result<Self, LedgerError> {
        draft.validate()?;
        let id = derive_category_id(&draft.label, identity)?;
        Ok(Self {
            id,
            label: draft.label.trim().to_string(),
            emoji: draft.emoji,
            color: draft.color,
            owner: CategoryOwner::Identity(identity.clone()),
        })
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.owner, CategoryOwner::Shared)
    }
}

impl Identifiable for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        format!("{} {}", self.emoji, self.label)
    }
}

/// Who a category belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOwner {
    #[default]
    Shared,
    Identity(Identity),
}

impl fmt::Display for CategoryOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryOwner::Shared => f.write_str("shared"),
            CategoryOwner::Identity(identity) => write!(f, "{}", identity),
        }
    }
}

/// User input for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDraft {
    pub label: String,
    pub emoji: String,
    pub color: String,
}

impl CategoryDraft {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            emoji: DEFAULT_EMOJI.into(),
            color: DEFAULT_COLOR.into(),
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = emoji.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.label.trim().is_empty() {
            return Err(LedgerError::Validation("category label is required".into()));
        }
        if self.emoji.trim().is_empty() {
            return Err(LedgerError::Validation("category emoji is required".into()));
        }
        Ok(())
    }
}

/// Normalizes a label into its identifier slug: lowercase, whitespace runs as
/// single hyphens, anything outside `a-z0-9-` dropped.
pub fn slugify_label(label: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = false;
    for ch in label.trim().chars() {
        if ch.is_whitespace() || ch == '-' {
            if !slug.is_empty() && !last_dash {
                slug.push('-');
                last_dash = true;
            }
        } else if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        }
    }
    slug.trim_matches('-').to_string()
}

/// Derives the identity-scoped identifier of a new category.
pub fn derive_category_id(label: &str, identity: &Identity) -> Result<String, LedgerError> {
    let slug = slugify_label(label);
    if slug.is_empty() {
        return Err(LedgerError::Validation(format!(
            "category label `{}` has no usable characters",
            label
        )));
    }
    let suffix = identity.scope_suffix();
    if suffix.is_empty() {
        Ok(slug)
    } else {
        Ok(format!("{}-{}", slug, suffix))
    }
}

static DEFAULT_CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
    vec![
        Category::shared("verduleria", "Verdulería", "🥬", "hsl(152, 60%, 45%)"),
        Category::shared("carniceria", "Carnicería", "🥩", "hsl(0, 70%, 55%)"),
        Category::shared("almacen", "Almacén", "🍞", "hsl(38, 92%, 50%)"),
        Category::shared("limpieza", "Limpieza", "🧹", "hsl(200, 70%, 50%)"),
        Category::shared("otros", "Otros", "📦", "hsl(220, 15%, 50%)"),
    ]
});

/// Built-in categories available to every identity.
pub fn default_categories() -> &'static [Category] {
    &DEFAULT_CATEGORIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_hyphenates() {
        assert_eq!(slugify_label("  Comida   Rápida! "), "comida-rpida");
        assert_eq!(slugify_label("Kiosco / Almacén"), "kiosco-almacn");
        assert_eq!(slugify_label("???"), "");
    }

    #[test]
    fn derived_id_carries_identity_suffix() {
        let identity = Identity::new("USER-1234-abcd");
        let id = derive_category_id("Gym Pass", &identity).unwrap();
        assert_eq!(id, "gym-pass-user1234");
    }

    #[test]
    fn derived_id_rejects_symbol_only_labels() {
        let identity = Identity::new("u1");
        let err = derive_category_id("✨✨", &identity).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn owned_by_trims_label_and_sets_owner() {
        let identity = Identity::new("alice");
        let category = Category::owned_by(
            &identity,
            CategoryDraft::new("  Coffee ").with_emoji("☕"),
        )
        .unwrap();
        assert_eq!(category.id, "coffee-alice");
        assert_eq!(category.label, "Coffee");
        assert_eq!(category.owner, CategoryOwner::Identity(identity));
        assert!(!category.is_shared());
    }

    #[test]
    fn default_categories_are_shared_and_unique() {
        let defaults = default_categories();
        assert_eq!(defaults.len(), 5);
        assert!(defaults.iter().all(Category::is_shared));
        let mut ids: Vec<_> = defaults.iter().map(|c| c.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }
}
