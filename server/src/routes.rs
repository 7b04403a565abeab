//! HTTP Routes
//!
//! Maps requests onto the commands layer. The caller is identified by the
//! `x-user-id` header set by the authenticating proxy in front of the server.
//! Every failure is answered as `{"error": message}` with its status.

use std::convert::Infallible;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::QueryRejection, FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use recipe_form::{EditorModel, ErrorBody, MyRecipes, RecipeSummary, RecipeView, SaveSuccess};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::commands;
use crate::domain::{DomainError, DomainResult, RequestIdentity};
use crate::AppState;

pub const USER_HEADER: &str = "x-user-id";

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Identity of the caller
pub struct CurrentUser(pub RequestIdentity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claimed = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok());

        Ok(CurrentUser(RequestIdentity::resolve(state.users.clone(), claimed)))
    }
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PublishQuery {
    pub id: i64,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> DomainResult<T> {
    query
        .map(|Query(q)| q)
        .map_err(|_| DomainError::InvalidInput("Bad recipe id".to_string()))
}

async fn published_handler(State(state): State<AppState>) -> DomainResult<Json<Vec<RecipeSummary>>> {
    commands::list_published(&state).await.map(Json)
}

async fn my_recipes_handler(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
) -> DomainResult<Json<MyRecipes>> {
    commands::my_recipes(&state, &who).await.map(Json)
}

async fn create_handler(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
) -> DomainResult<Redirect> {
    let id = commands::create_recipe(&state, &who).await?;
    Ok(Redirect::to(&format!("{}/edit?id={}", state.base_uri, id)))
}

async fn edit_handler(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    q: Result<Query<IdQuery>, QueryRejection>,
) -> DomainResult<Json<EditorModel>> {
    let q = query(q)?;
    commands::open_editor(&state, &who, q.id).await.map(Json)
}

async fn save_handler(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    body: Bytes,
) -> DomainResult<Json<SaveSuccess>> {
    commands::save_recipe(&state, &who, &body).await.map(Json)
}

async fn publish_handler(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    q: Result<Query<PublishQuery>, QueryRejection>,
) -> DomainResult<Json<RecipeSummary>> {
    let q = query(q)?;
    commands::set_published(&state, &who, q.id, q.published)
        .await
        .map(Json)
}

async fn delete_handler(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    q: Result<Query<IdQuery>, QueryRejection>,
) -> DomainResult<StatusCode> {
    let q = query(q)?;
    commands::delete_recipe(&state, &who, q.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn view_handler(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    q: Result<Query<IdQuery>, QueryRejection>,
) -> DomainResult<Json<RecipeView>> {
    let q = query(q)?;
    commands::view_recipe(&state, &who, q.id).await.map(Json)
}

/// All routes, mounted under the configured base path
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(published_handler))
        .route("/published", get(published_handler))
        .route("/my_recipes", get(my_recipes_handler))
        .route("/create", post(create_handler))
        .route("/edit", get(edit_handler))
        .route("/save", post(save_handler))
        .route("/publish", post(publish_handler))
        .route("/delete", post(delete_handler))
        .route("/view", get(view_handler));

    let app = if state.base_uri.is_empty() {
        routes
    } else {
        Router::new().nest(&state.base_uri, routes)
    };

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
