//! Entity listing, counting and query planning.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::catalog::{ColumnType, EntityDefinition, MatchKind};
use crate::error::{AppError, AppResult};
use crate::query::{EntityQuery, Pagination, SortDirection, parse_filter, validate_order};
use crate::state::AppState;

/// Create the entity router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/entities", get(list_entities))
        .route("/api/{entity}", get(list_rows))
        .route("/api/{entity}/count", get(count_rows))
        .route("/api/{entity}/plan", get(plan_query))
}

/// Query-string parameters shared by the entity endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub filter: Option<String>,
    pub order_by: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct FilterSummary<'a> {
    name: &'a str,
    match_kind: MatchKind,
}

#[derive(Debug, Serialize)]
struct OrderSummary<'a> {
    name: &'a str,
    data_type: ColumnType,
    orderable: bool,
}

#[derive(Debug, Serialize)]
struct EntitySummary<'a> {
    name: &'a str,
    filters: Vec<FilterSummary<'a>>,
    ordering: Vec<OrderSummary<'a>>,
}

impl<'a> From<&'a EntityDefinition> for EntitySummary<'a> {
    fn from(entity: &'a EntityDefinition) -> Self {
        Self {
            name: &entity.name,
            filters: entity
                .filters
                .iter()
                .map(|f| FilterSummary {
                    name: &f.name,
                    match_kind: f.match_kind,
                })
                .collect(),
            ordering: entity
                .ordering
                .iter()
                .map(|c| OrderSummary {
                    name: &c.name,
                    data_type: c.data_type,
                    orderable: c.data_type.is_orderable(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PlannedSql {
    select: String,
    count: String,
}

#[derive(Debug, Serialize)]
struct PlanResponse<'a> {
    entity: &'a str,
    #[serde(flatten)]
    query: &'a EntityQuery<'a>,
    sql: PlannedSql,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    items: Vec<JsonValue>,
    total: u64,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    total: u64,
}

/// Validate request parameters into a query for `name`.
fn resolve<'a>(
    state: &'a AppState,
    name: &str,
    params: &ListParams,
) -> AppResult<EntityQuery<'a>> {
    let entity = state
        .catalog()
        .get(name)
        .ok_or_else(|| AppError::UnknownEntity(name.to_string()))?;

    let filter = parse_filter(params.filter.as_deref(), &entity.filter_names())?;
    let order = validate_order(entity, params.order_by.as_deref(), params.direction)?;
    let pagination =
        Pagination::from_params(params.offset, params.limit, state.default_page_limit())?;

    Ok(EntityQuery::new(entity, filter, order, pagination)?)
}

/// Catalog summary.
async fn list_entities(State(state): State<AppState>) -> Json<JsonValue> {
    let entities: Vec<EntitySummary<'_>> = state.catalog().iter().map(Into::into).collect();
    Json(serde_json::json!({ "entities": entities }))
}

/// Parsed query and rendered SQL, without touching the database.
async fn plan_query(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<JsonValue>> {
    let query = resolve(&state, &entity, &params)?;
    let plan = PlanResponse {
        entity: &query.entity().name,
        query: &query,
        sql: PlannedSql {
            select: query.build_select(),
            count: query.build_count(),
        },
    };
    Ok(Json(serde_json::to_value(&plan).map_err(anyhow::Error::from)?))
}

/// One page of rows plus the total match count.
async fn list_rows(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ListResponse>> {
    let query = resolve(&state, &entity, &params)?;
    let store = state.store();

    let (total, items) = tokio::try_join!(store.count(&query), store.fetch(&query))?;

    tracing::debug!(entity = %entity, total, returned = items.len(), "listed rows");

    Ok(Json(ListResponse {
        items,
        total,
        pagination: query.pagination(),
    }))
}

/// Number of rows matching the filter.
async fn count_rows(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<CountResponse>> {
    let query = resolve(&state, &entity, &params)?;
    let total = state.store().count(&query).await?;
    Ok(Json(CountResponse { total }))
}
