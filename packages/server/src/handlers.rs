//! HTTP handler functions for the dashboard API.

use actix_web::{HttpResponse, web};
use pdx_crime_analytics::{
    AnalyticsError, bucket_by_hour, bucket_by_month, count_by_neighborhood,
    count_by_offense_and_neighborhood, filter_choices, heatmap_matrix, neighborhood_rank,
    neighborhood_table, record_total, summarize,
};
use pdx_crime_analytics_models::{FilterContext, OffenseNeighborhoodCounts};
use pdx_crime_report_models::Report;
use pdx_crime_server_models::{
    ApiAveragePerDay, ApiError, ApiHealth, ApiLookup, ApiRank, DashboardQueryParams,
    LookupQueryParams,
};

use crate::AppState;

/// Parses the filter selection or returns a `400` response.
macro_rules! filter_or_400 {
    ($params:expr) => {
        match $params.filter_context() {
            Ok(filter) => filter,
            Err(e) => return HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
        }
    };
}

/// Rows that pass the sidebar filters, ignoring the neighborhood.
fn scoped<'a>(state: &'a AppState, filter: &'a FilterContext) -> impl Iterator<Item = &'a Report> {
    state
        .dataset
        .reports
        .iter()
        .filter(move |r| filter.matches_scope(r))
}

fn scoped_offense_counts(state: &AppState, filter: &FilterContext) -> OffenseNeighborhoodCounts {
    count_by_offense_and_neighborhood(scoped(state, filter))
}

fn analytics_error(e: AnalyticsError) -> HttpResponse {
    log::error!("Aggregate could not be computed: {e}");
    HttpResponse::UnprocessableEntity().json(ApiError::new(e.to_string()))
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        reports: state.dataset.len(),
        boundaries: state.boundaries.as_ref().map_or(0, |b| b.len()),
    })
}

/// `GET /api/filters`
///
/// Returns the choices for the sidebar filter widgets.
pub async fn filters(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(filter_choices(&state.dataset.reports))
}

/// `GET /api/summary`
///
/// Returns every aggregate for one rendering pass.
pub async fn summary(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let mut options = state.options;
    if let Some(limit) = params.limit {
        options.top_offenses = limit;
    }

    match summarize(&state.dataset.reports, &filter, &options) {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => analytics_error(e),
    }
}

/// `GET /api/neighborhoods`
///
/// Report counts per neighborhood for the choropleth, busiest first.
pub async fn neighborhoods(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let counts = count_by_neighborhood(scoped(&state, &filter));
    HttpResponse::Ok().json(neighborhood_table(&counts))
}

/// `GET /api/offenses/top`
pub async fn top_offenses(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let counts = scoped_offense_counts(&state, &filter);
    let limit = params.limit.unwrap_or(state.options.top_offenses);

    HttpResponse::Ok().json(pdx_crime_analytics::top_offenses(
        &counts,
        filter.neighborhood(),
        limit,
    ))
}

/// `GET /api/total`
///
/// Headline record count and its deviation from the neighborhood average.
/// Responds `422` when no neighborhoods are in scope.
pub async fn total(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let counts = scoped_offense_counts(&state, &filter);

    match record_total(&counts, filter.neighborhood()) {
        Ok(total) => HttpResponse::Ok().json(total),
        Err(e) => analytics_error(e),
    }
}

/// `GET /api/rank`
pub async fn rank(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let counts = scoped_offense_counts(&state, &filter);
    let neighborhood = filter.neighborhood();

    HttpResponse::Ok().json(ApiRank {
        neighborhood: neighborhood.map(str::to_string),
        rank: neighborhood.and_then(|n| neighborhood_rank(&counts, n)),
        out_of: counts.neighborhood_totals().len(),
    })
}

/// `GET /api/average-per-day`
///
/// Responds `404` when no day span is configured.
pub async fn average_per_day(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let Some(total_day_span) = state.options.total_day_span else {
        return HttpResponse::NotFound().json(ApiError::new("total_day_span is not configured"));
    };

    let counts = scoped_offense_counts(&state, &filter);
    match pdx_crime_analytics::average_per_day(&counts, total_day_span) {
        Ok(average_per_day) => HttpResponse::Ok().json(ApiAveragePerDay {
            average_per_day,
            total_day_span,
        }),
        Err(e) => analytics_error(e),
    }
}

/// `GET /api/hours`
pub async fn hours(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    HttpResponse::Ok().json(bucket_by_hour(&state.dataset.reports, &filter))
}

/// `GET /api/months`
pub async fn months(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let limit = params.limit.unwrap_or(state.options.months);
    HttpResponse::Ok().json(bucket_by_month(&state.dataset.reports, &filter, limit))
}

/// `GET /api/heatmap`
pub async fn heatmap(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let counts = scoped_offense_counts(&state, &filter);

    HttpResponse::Ok().json(heatmap_matrix(
        &counts,
        params.rows.unwrap_or(state.options.heatmap_neighborhoods),
        params.columns.unwrap_or(state.options.heatmap_offenses),
    ))
}

/// `GET /api/map`
///
/// Boundary collection annotated with per-neighborhood report counts.
pub async fn map(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let filter = filter_or_400!(params);
    let Some(boundaries) = &state.boundaries else {
        return HttpResponse::NotFound().json(ApiError::new("No boundary file loaded"));
    };

    let counts = count_by_neighborhood(scoped(&state, &filter));
    HttpResponse::Ok().json(boundaries.annotate(&counts))
}

/// `GET /api/map/lookup`
///
/// Resolves a clicked point to a neighborhood name.
pub async fn map_lookup(
    state: web::Data<AppState>,
    params: web::Query<LookupQueryParams>,
) -> HttpResponse {
    let Some(boundaries) = &state.boundaries else {
        return HttpResponse::NotFound().json(ApiError::new("No boundary file loaded"));
    };

    HttpResponse::Ok().json(ApiLookup {
        neighborhood: boundaries.lookup(params.lng, params.lat).map(str::to_string),
    })
}
