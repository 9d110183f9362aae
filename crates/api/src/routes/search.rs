//! Professional search.

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::ProfessionalSummary;
use domain::services::{rank_professionals, SearchCandidate, SearchQuery};
use persistence::repositories::{CategoryRepository, ProfessionalRepository, SearchFilters};
use shared::pagination::{PageParams, Paginated};

/// Filters in SQL, then applies the radius and ranking in memory before
/// paginating.
///
/// GET /api/v1/search
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paginated<ProfessionalSummary>>, ApiError> {
    query.validate()?;

    let search = &state.config.search;
    let params = PageParams {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(search.default_per_page),
    }
    .clamped(search.max_per_page);

    let category_id = match query.category_filter() {
        Some(slug) => {
            let category = CategoryRepository::new(state.pool.clone())
                .find_by_slug(slug)
                .await?
                .filter(|c| c.active);
            match category {
                Some(category) => Some(category.id),
                None => {
                    tracing::debug!(category = slug, "Search for unknown category");
                    return Ok(Json(Paginated::new(Vec::new(), params, 0)));
                }
            }
        }
        None => None,
    };

    let filters = SearchFilters {
        category_id,
        city: query.city_filter(),
        province: query.province_filter(),
        text: query.text(),
    };

    let candidates: Vec<SearchCandidate> = ProfessionalRepository::new(state.pool.clone())
        .search_candidates(&filters)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let ranked = rank_professionals(candidates, query.origin(), query.radius_km);

    Ok(Json(Paginated::from_sorted(ranked, params)))
}
