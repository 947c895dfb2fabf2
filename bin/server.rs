// OSIntranet - Web Server
// REST façade over the query and command handlers

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use osintranet::builder::RegnskabView;
use osintranet::service::adresse::{
    AdresseOpret, AdressegruppeOpret, AdresselisteGet, BetalingsbetingelseOpret, TelefonlisteGet,
};
use osintranet::service::finansstyring::{
    Adressekonto, BogforingslinjeOpret, BogforingslinjerGet, BudgetkontoplanGet, DebitorlisteGet,
    KontoplanGet, KontoplanImport, KreditorlisteGet, RegnskabslisteGet,
};
use osintranet::service::foodwaste::{
    DataProviderAdd, FoodGroupAdd, FoodGroupMove, FoodGroupTreeGet, FoodGroupTreeNode,
    FoodItemAdd, FoodItemCollectionGet, HouseholdAdd, HouseholdAddHouseholdMember,
    HouseholdCollectionGet, HouseholdMemberAcceptPrivacyPolicy, HouseholdMemberActivate,
    HouseholdMemberAdd, HouseholdMemberUpgradeMembership, HouseholdRemoveHouseholdMember,
    PaymentInput, StorageAdd, StorageTypeAdd,
};
use osintranet::service::kalender::{AftaleOpret, AftaleTilmeld, AftalerGet, BrugerOpret};
use osintranet::{
    logging, Adresse, Aftale, AdresseService, AuditRepository, Bogforingsresultat, Bruger,
    CommandHandler, Config, DataProvider, Event, FaultKind, FinansstyringService, FoodGroup,
    FoodItem, FoodWasteService, Household, HouseholdMember, IntranetError, IntranetResult,
    KalenderService, Membership, Postering, QueryHandler, SqliteRepository, Storage, StorageType,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    repo: Arc<Mutex<SqliteRepository>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

struct ApiError(IntranetError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let fault = self.0.fault();
        let status = match fault {
            FaultKind::Validation => StatusCode::BAD_REQUEST,
            FaultKind::Business => StatusCode::CONFLICT,
            FaultKind::NotFound => StatusCode::NOT_FOUND,
            FaultKind::System | FaultKind::Repository => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(fault = fault.as_str(), error = %self.0, "request failed");
        } else {
            warn!(fault = fault.as_str(), error = %self.0, "request rejected");
        }
        let body = ApiResponse::<()>::err(format!("{}: {}", fault.as_str(), self.0));
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Runs one handler against the locked repository
fn with_repo<T>(
    state: &AppState,
    f: impl FnOnce(&SqliteRepository) -> IntranetResult<T>,
) -> ApiResult<T> {
    let repo = state
        .repo
        .lock()
        .map_err(|_| ApiError(IntranetError::System("repository lock poisoned".to_string())))?;
    f(&repo).map(|data| Json(ApiResponse::ok(data))).map_err(ApiError)
}

// ============================================================================
// Query parameters and bodies
// ============================================================================

#[derive(Deserialize)]
struct DatoQuery {
    dato: Option<NaiveDate>,
}

impl DatoQuery {
    fn dato(&self) -> NaiveDate {
        self.dato.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Deserialize)]
struct LinjerQuery {
    dato: Option<NaiveDate>,
    antal: Option<usize>,
}

#[derive(Deserialize)]
struct TidsrumQuery {
    fra: NaiveDateTime,
    til: NaiveDateTime,
}

#[derive(Deserialize)]
struct FoodGroupQuery {
    culture: Option<String>,
    #[serde(default)]
    include_inactive: bool,
}

#[derive(Deserialize)]
struct ActivationBody {
    activation_code: String,
}

#[derive(Deserialize)]
struct MembershipBody {
    membership: Membership,
    membership_expire_time: Option<chrono::DateTime<chrono::Utc>>,
    payment: Option<PaymentInput>,
}

#[derive(Deserialize)]
struct MailBody {
    mail_address: String,
}

#[derive(Deserialize)]
struct StorageBody {
    sort_order: u8,
    storage_type: Uuid,
    description: Option<String>,
    temperature: i32,
}

#[derive(Deserialize)]
struct FoodItemQuery {
    food_group: Option<Uuid>,
}

#[derive(Deserialize)]
struct ParentBody {
    parent: Option<Uuid>,
}

// ============================================================================
// Finansstyring handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/regnskaber
async fn get_regnskaber(State(state): State<AppState>) -> ApiResult<Vec<RegnskabView>> {
    with_repo(&state, |repo| FinansstyringService::new(repo).query(RegnskabslisteGet))
}

/// PUT /api/kontoplan - Create or replace a chart of accounts
async fn put_kontoplan(
    State(state): State<AppState>,
    Json(command): Json<KontoplanImport>,
) -> ApiResult<RegnskabView> {
    with_repo(&state, |repo| FinansstyringService::new(repo).execute(command))
}

/// GET /api/regnskaber/:nummer/kontoplan?dato=
async fn get_kontoplan(
    State(state): State<AppState>,
    Path(regnskab): Path<i32>,
    Query(query): Query<DatoQuery>,
) -> ApiResult<Vec<osintranet::finansstyring::Kontostatus>> {
    with_repo(&state, |repo| {
        FinansstyringService::new(repo).query(KontoplanGet { regnskab, dato: query.dato() })
    })
}

/// GET /api/regnskaber/:nummer/budgetkontoplan?dato=
async fn get_budgetkontoplan(
    State(state): State<AppState>,
    Path(regnskab): Path<i32>,
    Query(query): Query<DatoQuery>,
) -> ApiResult<Vec<osintranet::finansstyring::Budgetkontostatus>> {
    with_repo(&state, |repo| {
        FinansstyringService::new(repo).query(BudgetkontoplanGet { regnskab, dato: query.dato() })
    })
}

/// GET /api/regnskaber/:nummer/bogforingslinjer?dato=&antal=
async fn get_bogforingslinjer(
    State(state): State<AppState>,
    Path(regnskab): Path<i32>,
    Query(query): Query<LinjerQuery>,
) -> ApiResult<Vec<osintranet::builder::BogforingslinjeView>> {
    with_repo(&state, |repo| {
        FinansstyringService::new(repo).query(BogforingslinjerGet {
            regnskab,
            dato: query.dato.unwrap_or_else(|| Local::now().date_naive()),
            antal: query.antal.unwrap_or(50),
        })
    })
}

/// POST /api/regnskaber/:nummer/bogforingslinjer
async fn post_bogforingslinje(
    State(state): State<AppState>,
    Path(regnskab): Path<i32>,
    Json(postering): Json<Postering>,
) -> ApiResult<Bogforingsresultat> {
    with_repo(&state, |repo| {
        FinansstyringService::new(repo).execute(BogforingslinjeOpret { regnskab, postering })
    })
}

/// GET /api/regnskaber/:nummer/debitorer?dato=
async fn get_debitorer(
    State(state): State<AppState>,
    Path(regnskab): Path<i32>,
    Query(query): Query<DatoQuery>,
) -> ApiResult<Vec<Adressekonto>> {
    with_repo(&state, |repo| {
        FinansstyringService::new(repo).query(DebitorlisteGet { regnskab, dato: query.dato() })
    })
}

/// GET /api/regnskaber/:nummer/kreditorer?dato=
async fn get_kreditorer(
    State(state): State<AppState>,
    Path(regnskab): Path<i32>,
    Query(query): Query<DatoQuery>,
) -> ApiResult<Vec<Adressekonto>> {
    with_repo(&state, |repo| {
        FinansstyringService::new(repo).query(KreditorlisteGet { regnskab, dato: query.dato() })
    })
}

// ============================================================================
// Adressekartotek handlers
// ============================================================================

async fn get_adresser(State(state): State<AppState>) -> ApiResult<Vec<Adresse>> {
    with_repo(&state, |repo| AdresseService::new(repo).query(AdresselisteGet))
}

async fn post_adresse(
    State(state): State<AppState>,
    Json(command): Json<AdresseOpret>,
) -> ApiResult<Adresse> {
    with_repo(&state, |repo| AdresseService::new(repo).execute(command))
}

async fn get_telefonliste(
    State(state): State<AppState>,
) -> ApiResult<Vec<osintranet::Telefonlisteelement>> {
    with_repo(&state, |repo| AdresseService::new(repo).query(TelefonlisteGet))
}

async fn post_adressegruppe(
    State(state): State<AppState>,
    Json(command): Json<AdressegruppeOpret>,
) -> ApiResult<osintranet::adressekartotek::Adressegruppe> {
    with_repo(&state, |repo| AdresseService::new(repo).execute(command))
}

async fn post_betalingsbetingelse(
    State(state): State<AppState>,
    Json(command): Json<BetalingsbetingelseOpret>,
) -> ApiResult<osintranet::adressekartotek::Betalingsbetingelse> {
    with_repo(&state, |repo| AdresseService::new(repo).execute(command))
}

// ============================================================================
// Kalender handlers
// ============================================================================

/// GET /api/kalender/:system/brugere/:bruger/aftaler?fra=&til=
async fn get_aftaler(
    State(state): State<AppState>,
    Path((system, bruger)): Path<(i32, i32)>,
    Query(query): Query<TidsrumQuery>,
) -> ApiResult<Vec<Aftale>> {
    with_repo(&state, |repo| {
        KalenderService::new(repo).query(AftalerGet { system, bruger, fra: query.fra, til: query.til })
    })
}

async fn post_aftale(
    State(state): State<AppState>,
    Json(command): Json<AftaleOpret>,
) -> ApiResult<Aftale> {
    with_repo(&state, |repo| KalenderService::new(repo).execute(command))
}

/// POST /api/kalender/:system/aftaler/:aftale/deltagere/:bruger
async fn post_deltager(
    State(state): State<AppState>,
    Path((system, aftale, bruger)): Path<(i32, i32, i32)>,
) -> ApiResult<()> {
    with_repo(&state, |repo| {
        KalenderService::new(repo).execute(AftaleTilmeld { system, aftale, bruger })
    })
}

async fn post_bruger(
    State(state): State<AppState>,
    Json(command): Json<BrugerOpret>,
) -> ApiResult<Bruger> {
    with_repo(&state, |repo| KalenderService::new(repo).execute(command))
}

// ============================================================================
// Food waste handlers
// ============================================================================

async fn post_member(
    State(state): State<AppState>,
    Json(command): Json<HouseholdMemberAdd>,
) -> ApiResult<HouseholdMember> {
    with_repo(&state, |repo| FoodWasteService::new(repo).execute(command))
}

async fn post_member_activate(
    State(state): State<AppState>,
    Path(household_member): Path<Uuid>,
    Json(body): Json<ActivationBody>,
) -> ApiResult<HouseholdMember> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).execute(HouseholdMemberActivate {
            household_member,
            activation_code: body.activation_code,
        })
    })
}

async fn post_member_privacy_policy(
    State(state): State<AppState>,
    Path(household_member): Path<Uuid>,
) -> ApiResult<HouseholdMember> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).execute(HouseholdMemberAcceptPrivacyPolicy { household_member })
    })
}

async fn post_member_membership(
    State(state): State<AppState>,
    Path(household_member): Path<Uuid>,
    Json(body): Json<MembershipBody>,
) -> ApiResult<HouseholdMember> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).execute(HouseholdMemberUpgradeMembership {
            household_member,
            membership: body.membership,
            membership_expire_time: body.membership_expire_time,
            payment: body.payment,
        })
    })
}

/// GET /api/foodwaste/members/:id/households
async fn get_member_households(
    State(state): State<AppState>,
    Path(household_member): Path<Uuid>,
) -> ApiResult<Vec<Household>> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).query(HouseholdCollectionGet { household_member })
    })
}

async fn post_household(
    State(state): State<AppState>,
    Json(command): Json<HouseholdAdd>,
) -> ApiResult<Household> {
    with_repo(&state, |repo| FoodWasteService::new(repo).execute(command))
}

async fn post_household_member(
    State(state): State<AppState>,
    Path(household): Path<Uuid>,
    Json(body): Json<MailBody>,
) -> ApiResult<Household> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).execute(HouseholdAddHouseholdMember {
            household,
            mail_address: body.mail_address,
        })
    })
}

/// DELETE /api/foodwaste/households/:id/members/:mail
async fn delete_household_member(
    State(state): State<AppState>,
    Path((household, mail_address)): Path<(Uuid, String)>,
) -> ApiResult<Household> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).execute(HouseholdRemoveHouseholdMember { household, mail_address })
    })
}

async fn post_storage(
    State(state): State<AppState>,
    Path(household): Path<Uuid>,
    Json(body): Json<StorageBody>,
) -> ApiResult<Storage> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).execute(StorageAdd {
            household,
            sort_order: body.sort_order,
            storage_type: body.storage_type,
            description: body.description,
            temperature: body.temperature,
        })
    })
}

async fn post_storage_type(
    State(state): State<AppState>,
    Json(command): Json<StorageTypeAdd>,
) -> ApiResult<StorageType> {
    with_repo(&state, |repo| FoodWasteService::new(repo).execute(command))
}

async fn post_data_provider(
    State(state): State<AppState>,
    Json(command): Json<DataProviderAdd>,
) -> ApiResult<DataProvider> {
    with_repo(&state, |repo| FoodWasteService::new(repo).execute(command))
}

/// GET /api/foodwaste/food-groups?culture=&include_inactive=
async fn get_food_groups(
    State(state): State<AppState>,
    Query(query): Query<FoodGroupQuery>,
) -> ApiResult<Vec<FoodGroupTreeNode>> {
    let culture = query
        .culture
        .unwrap_or_else(|| osintranet::foodwaste::DEFAULT_CULTURE.to_string());
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).query(FoodGroupTreeGet {
            culture,
            include_inactive: query.include_inactive,
        })
    })
}

async fn post_food_group(
    State(state): State<AppState>,
    Json(command): Json<FoodGroupAdd>,
) -> ApiResult<FoodGroup> {
    with_repo(&state, |repo| FoodWasteService::new(repo).execute(command))
}

/// PUT /api/foodwaste/food-groups/:id/parent
async fn put_food_group_parent(
    State(state): State<AppState>,
    Path(food_group): Path<Uuid>,
    Json(body): Json<ParentBody>,
) -> ApiResult<()> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).execute(FoodGroupMove { food_group, parent: body.parent })
    })
}

/// GET /api/foodwaste/food-items?food_group=
async fn get_food_items(
    State(state): State<AppState>,
    Query(query): Query<FoodItemQuery>,
) -> ApiResult<Vec<FoodItem>> {
    with_repo(&state, |repo| {
        FoodWasteService::new(repo).query(FoodItemCollectionGet { food_group: query.food_group })
    })
}

async fn post_food_item(
    State(state): State<AppState>,
    Json(command): Json<FoodItemAdd>,
) -> ApiResult<FoodItem> {
    with_repo(&state, |repo| FoodWasteService::new(repo).execute(command))
}

// ============================================================================
// Audit trail
// ============================================================================

/// GET /api/events/:entity_type/:entity_id
async fn get_events(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> ApiResult<Vec<Event>> {
    with_repo(&state, |repo| repo.events_for(&entity_type, &entity_id))
}

// ============================================================================
// Main Server
// ============================================================================

fn router(state: AppState) -> Router {
    let finansstyring = Router::new()
        .route("/regnskaber", get(get_regnskaber))
        .route("/kontoplan", put(put_kontoplan))
        .route("/regnskaber/:nummer/kontoplan", get(get_kontoplan))
        .route("/regnskaber/:nummer/budgetkontoplan", get(get_budgetkontoplan))
        .route(
            "/regnskaber/:nummer/bogforingslinjer",
            get(get_bogforingslinjer).post(post_bogforingslinje),
        )
        .route("/regnskaber/:nummer/debitorer", get(get_debitorer))
        .route("/regnskaber/:nummer/kreditorer", get(get_kreditorer));

    let adresser = Router::new()
        .route("/adresser", get(get_adresser).post(post_adresse))
        .route("/telefonliste", get(get_telefonliste))
        .route("/adressegrupper", post(post_adressegruppe))
        .route("/betalingsbetingelser", post(post_betalingsbetingelse));

    let kalender = Router::new()
        .route("/kalender/:system/brugere/:bruger/aftaler", get(get_aftaler))
        .route("/kalender/aftaler", post(post_aftale))
        .route("/kalender/:system/aftaler/:aftale/deltagere/:bruger", post(post_deltager))
        .route("/kalender/brugere", post(post_bruger));

    let foodwaste = Router::new()
        .route("/members", post(post_member))
        .route("/members/:id/activate", post(post_member_activate))
        .route("/members/:id/privacy-policy", post(post_member_privacy_policy))
        .route("/members/:id/membership", post(post_member_membership))
        .route("/members/:id/households", get(get_member_households))
        .route("/households", post(post_household))
        .route("/households/:id/members", post(post_household_member))
        .route("/households/:id/members/:mail", delete(delete_household_member))
        .route("/households/:id/storages", post(post_storage))
        .route("/storage-types", post(post_storage_type))
        .route("/data-providers", post(post_data_provider))
        .route("/food-groups", get(get_food_groups).post(post_food_group))
        .route("/food-groups/:id/parent", put(put_food_group_parent))
        .route("/food-items", get(get_food_items).post(post_food_item));

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/events/:entity_type/:entity_id", get(get_events))
        .merge(finansstyring)
        .merge(adresser)
        .merge(kalender)
        .nest("/foodwaste", foodwaste)
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
    info!("Server shutting down...");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();
    logging::init(config.log_format)?;

    let repo = SqliteRepository::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let state = AppState {
        repo: Arc::new(Mutex::new(repo)),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!(address = %config.bind, "Server running");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState {
            repo: Arc::new(Mutex::new(SqliteRepository::open_in_memory().unwrap())),
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_path_segments_decoded_once() {
        let state = state();
        state
            .repo
            .lock()
            .unwrap()
            .record_event(&Event::new(
                "household_member_added",
                "household_member",
                "rabat%25@example.com",
                serde_json::json!({}),
                "test_actor",
            ))
            .unwrap();

        let (status, json) =
            get_json(router(state), "/api/events/household_member/rabat%2525@example.com").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, json) = get_json(router(state()), "/api/regnskaber/42/kontoplan").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }
}
