//! Professional search: radius filter and result ordering.
//!
//! The database applies the category, location text and verification filters;
//! this module narrows by distance and orders the remaining candidates by
//! availability, rating and review count.

use std::cmp::Ordering;

use geo::{HaversineDistance, Point};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::ProfessionalSummary;

/// Upper bound for `radius_km`.
pub const MAX_RADIUS_KM: f64 = 500.0;

/// Query string of `GET /api/v1/search`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_origin"))]
pub struct SearchQuery {
    /// Category slug; subcategories of it match too.
    pub category: Option<String>,

    #[validate(length(max = 80, message = "City must be at most 80 characters"))]
    pub city: Option<String>,

    #[validate(length(max = 80, message = "Province must be at most 80 characters"))]
    pub province: Option<String>,

    #[validate(length(max = 100, message = "Search text must be at most 100 characters"))]
    pub q: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub lng: Option<f64>,

    #[validate(range(min = 0.1, max = 500.0, message = "Radius must be between 0.1 and 500 km"))]
    pub radius_km: Option<f64>,

    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn validate_origin(query: &SearchQuery) -> Result<(), ValidationError> {
    let has_lat = query.lat.is_some();
    let has_lng = query.lng.is_some();
    if has_lat != has_lng {
        let mut err = ValidationError::new("origin_incomplete");
        err.message = Some("lat and lng must be given together".into());
        return Err(err);
    }
    if query.radius_km.is_some() && !has_lat {
        let mut err = ValidationError::new("origin_required");
        err.message = Some("radius_km requires lat and lng".into());
        return Err(err);
    }
    Ok(())
}

impl SearchQuery {
    /// Trimmed, non-empty text filter.
    pub fn text(&self) -> Option<&str> {
        non_blank(self.q.as_deref())
    }

    pub fn city_filter(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }

    pub fn province_filter(&self) -> Option<&str> {
        non_blank(self.province.as_deref())
    }

    pub fn category_filter(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    /// Search origin as `(lat, lng)` when both are present.
    pub fn origin(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lng)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Row produced by the filtered search query.
#[derive(Debug, Clone)]
pub struct SearchCandidate {
    pub id: Uuid,
    pub name: String,
    pub headline: String,
    pub city: String,
    pub province: String,
    pub available: bool,
    pub rating_avg: f64,
    pub review_count: i32,
    pub profile_image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub categories: Vec<String>,
}

/// Great-circle distance between two `(lat, lng)` pairs in kilometres.
pub fn distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let a = Point::new(from.1, from.0);
    let b = Point::new(to.1, to.0);
    a.haversine_distance(&b) / 1000.0
}

/// Applies the optional radius filter and orders candidates.
///
/// With an origin, every result carries `distance_km`; candidates without
/// coordinates are excluded only when a radius is given.
pub fn rank_professionals(
    candidates: Vec<SearchCandidate>,
    origin: Option<(f64, f64)>,
    radius_km: Option<f64>,
) -> Vec<ProfessionalSummary> {
    let mut results: Vec<ProfessionalSummary> = candidates
        .into_iter()
        .filter_map(|c| {
            let distance = match (origin, c.latitude.zip(c.longitude)) {
                (Some(o), Some(p)) => Some(distance_km(o, p)),
                _ => None,
            };
            if let Some(radius) = radius_km {
                match distance {
                    Some(d) if d <= radius => {}
                    _ => return None,
                }
            }
            Some(ProfessionalSummary {
                id: c.id,
                name: c.name,
                headline: c.headline,
                city: c.city,
                province: c.province,
                available: c.available,
                rating_avg: c.rating_avg,
                review_count: c.review_count,
                profile_image_url: c.profile_image_url,
                categories: c.categories,
                distance_km: distance.map(|d| (d * 10.0).round() / 10.0),
            })
        })
        .collect();

    results.sort_by(compare_rank);
    results
}

/// Available first, then higher rating, then more reviews.
fn compare_rank(a: &ProfessionalSummary, b: &ProfessionalSummary) -> Ordering {
    b.available
        .cmp(&a.available)
        .then_with(|| b.rating_avg.total_cmp(&a.rating_avg))
        .then_with(|| b.review_count.cmp(&a.review_count))
}
