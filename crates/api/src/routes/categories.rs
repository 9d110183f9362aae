//! Public category taxonomy endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::category::{build_tree, ListCategoriesQuery};
use domain::models::{Category, CategoryGroup, CategoryGroupTree};
use persistence::repositories::CategoryRepository;

#[derive(Debug, Serialize)]
pub struct CategoryGroupsResponse {
    pub groups: Vec<CategoryGroupTree>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct CategoryDetailResponse {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

/// Group tree of active categories.
///
/// GET /api/v1/category-groups
pub async fn list_groups(
    State(state): State<AppState>,
) -> Result<Json<CategoryGroupsResponse>, ApiError> {
    let repo = CategoryRepository::new(state.pool.clone());
    let groups: Vec<CategoryGroup> = repo.list_groups().await?.into_iter().map(Into::into).collect();
    let categories: Vec<Category> = repo.list(None, false).await?.into_iter().map(Into::into).collect();

    Ok(Json(CategoryGroupsResponse {
        groups: build_tree(groups, categories),
    }))
}

/// GET /api/v1/categories?group=<slug>
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let repo = CategoryRepository::new(state.pool.clone());

    let group_id = match query.group.as_deref() {
        Some(slug) => Some(
            repo.find_group_by_slug(slug)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Category group '{slug}' not found")))?
                .id,
        ),
        None => None,
    };

    // Inactive categories are only listed on the admin surface.
    let categories = repo
        .list(group_id, false)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(CategoriesResponse { categories }))
}

/// GET /api/v1/categories/:slug
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetailResponse>, ApiError> {
    let repo = CategoryRepository::new(state.pool.clone());
    let category: Category = repo
        .find_by_slug(&slug)
        .await?
        .filter(|c| c.active)
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?
        .into();

    let children = repo
        .children_of(category.id, false)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(CategoryDetailResponse { category, children }))
}
