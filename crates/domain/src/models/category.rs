//! Category taxonomy: groups ("oficios", "profesiones") containing categories
//! and one level of subcategories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Top-level taxonomy node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub group_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn is_subcategory(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Category with its direct subcategories.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

/// Group with its category tree.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroupTree {
    #[serde(flatten)]
    pub group: CategoryGroup,
    pub categories: Vec<CategoryNode>,
}

/// Builds the taxonomy tree from flat lists.
///
/// Categories are attached in the order given; children whose parent is not
/// present (e.g. an inactive parent filtered out) are dropped.
pub fn build_tree(groups: Vec<CategoryGroup>, categories: Vec<Category>) -> Vec<CategoryGroupTree> {
    let (roots, children): (Vec<_>, Vec<_>) =
        categories.into_iter().partition(|c| c.parent_id.is_none());

    groups
        .into_iter()
        .map(|group| {
            let categories = roots
                .iter()
                .filter(|c| c.group_id == group.id)
                .map(|root| CategoryNode {
                    children: children
                        .iter()
                        .filter(|c| c.parent_id == Some(root.id))
                        .cloned()
                        .collect(),
                    category: root.clone(),
                })
                .collect();
            CategoryGroupTree { group, categories }
        })
        .collect()
}

/// Violations of the taxonomy rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryRuleError {
    #[error("A subcategory must have a parent category")]
    MissingParent,

    #[error("Subcategories cannot be nested under another subcategory")]
    NestedSubcategory,

    #[error("A top-level category must belong to a group")]
    MissingGroup,
}

/// Where a new or moved category lands in the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub group_id: Uuid,
    pub parent_id: Option<Uuid>,
}

/// Applies the taxonomy rules.
///
/// A subcategory must name a parent, that parent must be top-level, and the
/// subcategory inherits the parent's group. A top-level category needs a group.
pub fn resolve_placement(
    is_subcategory: bool,
    parent: Option<&Category>,
    group_id: Option<Uuid>,
) -> Result<Placement, CategoryRuleError> {
    if is_subcategory {
        let parent = parent.ok_or(CategoryRuleError::MissingParent)?;
        if parent.is_subcategory() {
            return Err(CategoryRuleError::NestedSubcategory);
        }
        Ok(Placement {
            group_id: parent.group_id,
            parent_id: Some(parent.id),
        })
    } else {
        let group_id = group_id.ok_or(CategoryRuleError::MissingGroup)?;
        Ok(Placement {
            group_id,
            parent_id: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    /// Group slug; required for top-level categories.
    pub group: Option<String>,

    pub parent_id: Option<Uuid>,

    #[serde(default)]
    pub is_subcategory: bool,

    #[validate(length(min = 2, max = 80, message = "Name must be between 2 and 80 characters"))]
    pub name: String,

    /// Derived from the name when absent.
    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 50, message = "Icon must be at most 50 characters"))]
    pub icon: Option<String>,

    #[serde(default)]
    pub sort_order: i32,
}

impl CreateCategoryRequest {
    /// `is_subcategory` is implied by a parent id.
    pub fn wants_subcategory(&self) -> bool {
        self.is_subcategory || self.parent_id.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 2, max = 80, message = "Name must be between 2 and 80 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 50, message = "Icon must be at most 50 characters"))]
    pub icon: Option<String>,

    pub active: Option<bool>,

    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCategoriesQuery {
    pub group: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(group_id: Uuid, parent_id: Option<Uuid>, name: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            group_id,
            parent_id,
            name: name.to_string(),
            slug: crate::services::slug::slugify(name),
            description: None,
            icon: None,
            active: true,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_subcategory_requires_parent() {
        assert_eq!(
            resolve_placement(true, None, Some(Uuid::new_v4())),
            Err(CategoryRuleError::MissingParent)
        );
    }

    #[test]
    fn test_subcategory_inherits_parent_group() {
        let group = Uuid::new_v4();
        let parent = category(group, None, "Construcción");
        let placement = resolve_placement(true, Some(&parent), Some(Uuid::new_v4())).unwrap();
        assert_eq!(placement.group_id, group);
        assert_eq!(placement.parent_id, Some(parent.id));
    }

    #[test]
    fn test_no_second_level_nesting() {
        let group = Uuid::new_v4();
        let root = category(group, None, "Construcción");
        let child = category(group, Some(root.id), "Albañilería");
        assert_eq!(
            resolve_placement(true, Some(&child), None),
            Err(CategoryRuleError::NestedSubcategory)
        );
    }

    #[test]
    fn test_top_level_requires_group() {
        assert_eq!(
            resolve_placement(false, None, None),
            Err(CategoryRuleError::MissingGroup)
        );
        let group = Uuid::new_v4();
        let placement = resolve_placement(false, None, Some(group)).unwrap();
        assert_eq!(placement.parent_id, None);
    }

    #[test]
    fn test_parent_id_implies_subcategory() {
        let req: CreateCategoryRequest = serde_json::from_value(serde_json::json!({
            "name": "Gasista matriculado",
            "parent_id": Uuid::new_v4(),
        }))
        .unwrap();
        assert!(req.wants_subcategory());
    }

    #[test]
    fn test_build_tree_nests_children_under_roots() {
        let oficios = CategoryGroup {
            id: Uuid::new_v4(),
            slug: "oficios".into(),
            name: "Oficios".into(),
            sort_order: 1,
        };
        let profesiones = CategoryGroup {
            id: Uuid::new_v4(),
            slug: "profesiones".into(),
            name: "Profesiones".into(),
            sort_order: 2,
        };
        let plomeria = category(oficios.id, None, "Plomería");
        let cloacas = category(oficios.id, Some(plomeria.id), "Cloacas");
        let abogacia = category(profesiones.id, None, "Abogacía");
        let orphan = category(oficios.id, Some(Uuid::new_v4()), "Huérfana");

        let tree = build_tree(
            vec![oficios, profesiones],
            vec![plomeria.clone(), cloacas.clone(), abogacia, orphan],
        );

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].categories.len(), 1);
        assert_eq!(tree[0].categories[0].category.id, plomeria.id);
        assert_eq!(tree[0].categories[0].children.len(), 1);
        assert_eq!(tree[0].categories[0].children[0].id, cloacas.id);
        assert_eq!(tree[1].categories.len(), 1);
        assert!(tree[1].categories[0].children.is_empty());
    }
}
