use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::NaiveDate;
use tower_http::services::ServeDir;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::query::{ListQuery, Paginated};
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};
use crate::analytics::{
    DateRange, TimeBucket, RECENT_ORDERS_DEFAULT_LIMIT, RECENT_ORDERS_MAX_LIMIT,
};
use crate::music_store::SqliteMusicStore;
use crate::user::{
    AccountUpdate, AuthToken, AuthTokenValue, ProfileUpdate, RegisterRequest, UserAccount,
    UserManager, UserProfile,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn list_artists(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let params = query.params();
    let page = store.list_artists(&params)?;
    Ok(Json(Paginated::new(&params, page)).into_response())
}

async fn get_artist(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match store.get_artist(id)? {
        Some(artist) => Ok(Json(artist).into_response()),
        None => Err(ApiError::NotFound),
    }
}

async fn list_genres(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let params = query.params();
    let page = store.list_genres(&params)?;
    Ok(Json(Paginated::new(&params, page)).into_response())
}

async fn get_genre(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match store.get_genre(id)? {
        Some(genre) => Ok(Json(genre).into_response()),
        None => Err(ApiError::NotFound),
    }
}

async fn list_albums(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let params = query.params();
    let page = store.list_albums(&params, query.artist_id)?;
    Ok(Json(Paginated::new(&params, page)).into_response())
}

async fn get_album(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match store.get_album(id)? {
        Some(album) => Ok(Json(album).into_response()),
        None => Err(ApiError::NotFound),
    }
}

async fn list_tracks(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let params = query.params();
    let page = store.list_tracks(&params, query.album_id, query.genre_id)?;
    Ok(Json(Paginated::new(&params, page)).into_response())
}

async fn get_track(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match store.get_track(id)? {
        Some(track) => Ok(Json(track).into_response()),
        None => Err(ApiError::NotFound),
    }
}

async fn tracks_by_genre(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let genre_id = query
        .genre_id
        .ok_or_else(|| ApiError::bad_request("genre_id query parameter is required"))?;
    let params = query.params();
    let page = store.list_tracks(&params, None, Some(genre_id))?;
    Ok(Json(Paginated::new(&params, page)).into_response())
}

async fn list_customers(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let params = query.params();
    let page = store.list_customers(&params, query.country.as_deref())?;
    Ok(Json(Paginated::new(&params, page)).into_response())
}

async fn get_customer(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match store.get_customer(id)? {
        Some(customer) => Ok(Json(customer).into_response()),
        None => Err(ApiError::NotFound),
    }
}

async fn customers_by_country(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let country = query
        .country
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("country query parameter is required"))?
        .to_string();
    let params = query.params();
    let page = store.list_customers(&params, Some(&country))?;
    Ok(Json(Paginated::new(&params, page)).into_response())
}

async fn list_invoices(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    query: ListQuery,
) -> Result<Response, ApiError> {
    let params = query.params();
    let page = store.list_invoices(&params, query.customer_id)?;
    Ok(Json(Paginated::new(&params, page)).into_response())
}

async fn get_invoice(
    _session: Option<Session>,
    State(store): State<GuardedMusicStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match store.get_invoice(id)? {
        Some(invoice) => Ok(Json(invoice).into_response()),
        None => Err(ApiError::NotFound),
    }
}

#[derive(Debug, Default, Deserialize)]
struct SalesRangeQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

fn parse_day(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

impl SalesRangeQuery {
    fn range(&self) -> Result<DateRange, ApiError> {
        Ok(DateRange {
            start: self.start_date.as_deref().map(parse_day).transpose()?,
            end: self.end_date.as_deref().map(parse_day).transpose()?,
        })
    }
}

async fn sales_overview(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
    Query(query): Query<SalesRangeQuery>,
) -> Result<Response, ApiError> {
    let buckets = analytics.sales_over_time(TimeBucket::Month, &query.range()?)?;
    Ok(Json(buckets).into_response())
}

async fn yearly_comparison(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
    Query(query): Query<SalesRangeQuery>,
) -> Result<Response, ApiError> {
    let buckets = analytics.sales_over_time(TimeBucket::Year, &query.range()?)?;
    Ok(Json(buckets).into_response())
}

async fn genre_analysis(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
) -> Result<Response, ApiError> {
    Ok(Json(analytics.genre_analysis()?).into_response())
}

async fn country_analysis(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
) -> Result<Response, ApiError> {
    Ok(Json(analytics.country_analysis()?).into_response())
}

async fn top_tracks(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
) -> Result<Response, ApiError> {
    Ok(Json(analytics.top_tracks()?).into_response())
}

async fn top_artists(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
) -> Result<Response, ApiError> {
    Ok(Json(analytics.top_artists()?).into_response())
}

async fn top_albums(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
) -> Result<Response, ApiError> {
    Ok(Json(analytics.top_albums()?).into_response())
}

async fn top_customers(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
) -> Result<Response, ApiError> {
    Ok(Json(analytics.top_customers()?).into_response())
}

async fn dashboard_summary(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
) -> Result<Response, ApiError> {
    Ok(Json(analytics.dashboard_summary()?).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct RecentOrdersQuery {
    limit: Option<String>,
}

async fn recent_orders(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
    Query(query): Query<RecentOrdersQuery>,
) -> Result<Response, ApiError> {
    let limit = match query.limit.as_deref() {
        None => RECENT_ORDERS_DEFAULT_LIMIT,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::bad_request(format!("invalid limit '{}'", raw)))?
            .min(RECENT_ORDERS_MAX_LIMIT),
    };
    Ok(Json(analytics.recent_orders(limit)?).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

async fn search_analytics(
    _session: Option<Session>,
    State(analytics): State<GuardedAnalyticsStore>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("q query parameter is required"))?;
    Ok(Json(analytics.search_analytics(q)?).into_response())
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct AuthSuccessResponse {
    token: String,
    user_id: i64,
    username: String,
    email: String,
}

fn auth_success_response(status: StatusCode, account: UserAccount, token: AuthToken) -> Response {
    let cookie = Cookie::build(Cookie::new(COOKIE_SESSION_TOKEN_KEY, token.value.0.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    let body = AuthSuccessResponse {
        token: token.value.0,
        user_id: account.id,
        username: account.username,
        email: account.email,
    };

    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie.to_string()).unwrap(),
    );
    response
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let (account, token) = user_manager.register(body)?;
    Ok(auth_success_response(StatusCode::CREATED, account, token))
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Result<Response, ApiError> {
    let (account, token) = user_manager.login(&body.email, &body.password)?;
    Ok(auth_success_response(StatusCode::OK, account, token))
}

async fn logout(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
) -> Result<Response, ApiError> {
    user_manager.logout(&AuthTokenValue(session.token))?;

    let cookie = Cookie::build(Cookie::new(COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
        .same_site(SameSite::Lax)
        .build();

    let mut response = StatusCode::OK.into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie.to_string()).unwrap(),
    );
    Ok(response)
}

#[derive(Serialize)]
struct MeResponse {
    user: UserAccount,
    profile: UserProfile,
    permissions: Vec<&'static str>,
}

async fn get_me(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> Result<Response, ApiError> {
    let account = user_manager.get_user(session.user_id)?.ok_or(ApiError::NotFound)?;
    let profile = user_manager.get_or_create_profile(session.user_id)?;
    let permissions = session.permissions.iter().map(|p| p.name()).collect();
    Ok(Json(MeResponse {
        user: account,
        profile,
        permissions,
    })
    .into_response())
}

async fn get_profile(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> Result<Response, ApiError> {
    let profile = user_manager.get_or_create_profile(session.user_id)?;
    Ok(Json(profile).into_response())
}

async fn put_profile(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<ProfileUpdate>,
) -> Result<Response, ApiError> {
    let profile = user_manager.update_profile(session.user_id, &body)?;
    Ok(Json(profile).into_response())
}

async fn get_detail(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> Result<Response, ApiError> {
    let account = user_manager.get_user(session.user_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(account).into_response())
}

async fn put_detail(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<AccountUpdate>,
) -> Result<Response, ApiError> {
    let account = user_manager.update_account(session.user_id, body)?;
    Ok(Json(account).into_response())
}

impl ServerState {
    fn new(
        config: ServerConfig,
        music_store: Arc<SqliteMusicStore>,
        user_manager: UserManager,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            music_store: music_store.clone(),
            analytics_store: music_store,
            user_manager: Arc::new(user_manager),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    music_store: Arc<SqliteMusicStore>,
    user_manager: UserManager,
) -> Router {
    let state = ServerState::new(config.clone(), music_store, user_manager);

    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state.clone());

    let catalog_routes: Router = Router::new()
        .route("/artists", get(list_artists))
        .route("/artists/top_artists", get(top_artists))
        .route("/artists/{id}", get(get_artist))
        .route("/genres", get(list_genres))
        .route("/genres/{id}", get(get_genre))
        .route("/albums", get(list_albums))
        .route("/albums/top_albums", get(top_albums))
        .route("/albums/{id}", get(get_album))
        .route("/tracks", get(list_tracks))
        .route("/tracks/top_tracks", get(top_tracks))
        .route("/tracks/by_genre", get(tracks_by_genre))
        .route("/tracks/{id}", get(get_track))
        .route("/customers", get(list_customers))
        .route("/customers/top_customers", get(top_customers))
        .route("/customers/by_country", get(customers_by_country))
        .route("/customers/{id}", get(get_customer))
        .route("/invoices", get(list_invoices))
        .route("/invoices/{id}", get(get_invoice))
        .with_state(state.clone());

    let analytics_routes: Router = Router::new()
        .route("/sales_overview", get(sales_overview))
        .route("/yearly_comparison", get(yearly_comparison))
        .route("/genre_analysis", get(genre_analysis))
        .route("/country_analysis", get(country_analysis))
        .route("/top_tracks", get(top_tracks))
        .route("/top_artists", get(top_artists))
        .route("/top_albums", get(top_albums))
        .route("/top_customers", get(top_customers))
        .route("/dashboard_summary", get(dashboard_summary))
        .route("/recent_orders", get(recent_orders))
        .route("/search_analytics", get(search_analytics))
        .route("/by_genre", get(tracks_by_genre))
        .route("/by_country", get(customers_by_country))
        .with_state(state.clone());

    let user_routes: Router = Router::new()
        .route("/me", get(get_me))
        .route("/profile", get(get_profile))
        .route("/profile", put(put_profile))
        .route("/detail", get(get_detail))
        .route("/detail", put(put_detail))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/analytics", analytics_routes)
        .nest("/v1/user", user_routes)
        .nest("/v1", catalog_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
}

pub async fn run_server(
    music_store: SqliteMusicStore,
    user_manager: UserManager,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
    };
    let app = make_app(config, Arc::new(music_store), user_manager);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
