//! Admin category management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::categories::CategoriesResponse;
use domain::models::category::{
    resolve_placement, CreateCategoryRequest, ListCategoriesQuery, UpdateCategoryRequest,
};
use domain::models::Category;
use domain::services::slugify;
use persistence::repositories::{CategoryRepository, NewCategory};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", patch(update_category).delete(delete_category))
}

fn slug_conflict(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::Conflict("Slug already in use".into()),
        other => other,
    }
}

/// Every category, including inactive ones.
///
/// GET /api/v1/admin/categories
async fn list_categories(
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

    let categories = repo
        .list(group_id, query.include_inactive)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(CategoriesResponse { categories }))
}

/// Subcategories need a top-level parent and inherit its group; the slug
/// is derived from the name when absent.
///
/// POST /api/v1/admin/categories
async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    request.validate()?;
    let repo = CategoryRepository::new(state.pool.clone());
    let wants_subcategory = request.wants_subcategory();

    let parent: Option<Category> = match request.parent_id {
        Some(parent_id) => Some(
            repo.find_by_id(parent_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Parent category not found".into()))?
                .into(),
        ),
        None => None,
    };

    let group_id = match (wants_subcategory, request.group.as_deref()) {
        (false, Some(slug)) => Some(
            repo.find_group_by_slug(slug)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Category group '{slug}' not found")))?
                .id,
        ),
        _ => None,
    };

    let placement = resolve_placement(wants_subcategory, parent.as_ref(), group_id)?;

    let slug = match request.slug.as_deref() {
        Some(slug) => slug.to_string(),
        None => slugify(&request.name),
    };
    if slug.is_empty() {
        return Err(ApiError::Validation(
            "Could not derive a slug from the name".into(),
        ));
    }

    let category: Category = repo
        .create(&NewCategory {
            group_id: placement.group_id,
            parent_id: placement.parent_id,
            name: request.name.trim(),
            slug: &slug,
            description: request.description.as_deref(),
            icon: request.icon.as_deref(),
            sort_order: request.sort_order,
        })
        .await
        .map_err(slug_conflict)?
        .into();

    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH /api/v1/admin/categories/:id
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    request.validate()?;

    let category = CategoryRepository::new(state.pool.clone())
        .update(
            id,
            request.name.as_deref().map(str::trim),
            request.slug.as_deref(),
            request.description.as_deref(),
            request.icon.as_deref(),
            request.active,
            request.sort_order,
        )
        .await
        .map_err(slug_conflict)?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;

    Ok(Json(category.into()))
}

/// Refuses while services still reference the category or its children.
///
/// DELETE /api/v1/admin/categories/:id
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = CategoryRepository::new(state.pool.clone());

    let in_use = repo.count_services_in_tree(id).await?;
    if in_use > 0 {
        return Err(ApiError::Conflict(format!(
            "Category is used by {in_use} service(s); deactivate it instead"
        )));
    }

    if !repo.delete(id).await? {
        return Err(ApiError::NotFound("Category not found".into()));
    }

    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
