use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use recipe_box_lib::config::Config;
use recipe_box_lib::domain::{Capability, User};
use recipe_box_lib::repository::Database;
use recipe_box_lib::routes::{build_router, USER_HEADER};
use recipe_box_lib::AppState;
use recipe_form::{EditableElem, EditorModel, ErrorBody, SaveRequest, SaveResponse, SaveSuccess};
use serde::de::DeserializeOwned;
use tower::ServiceExt;

fn app() -> Router {
    let mut config = Config::default();
    config.users = vec![
        User {
            id: 1,
            name: "alice".to_string(),
            capabilities: vec![Capability::EditRecipe],
        },
        User {
            id: 2,
            name: "bob".to_string(),
            capabilities: vec![Capability::EditAnyRecipe],
        },
    ];
    let db = Database::open_in_memory(Duration::from_millis(20)).unwrap();
    build_router(AppState::new(Arc::new(db.recipe_store()), &config))
}

fn request(method: &str, uri: &str, uid: Option<i64>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(uid) = uid {
        builder = builder.header(USER_HEADER, uid.to_string());
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn json<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}

async fn create_and_open(app: &Router, uid: i64) -> EditorModel {
    let response = app
        .clone()
        .oneshot(request("POST", "/recipe/create", Some(uid), Vec::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with("/recipe/edit?id="), "{}", location);

    let (status, body) = send(app, request("GET", &location, Some(uid), Vec::new())).await;
    assert_eq!(status, StatusCode::OK);
    json(&body)
}

fn save_body(model: &EditorModel, key: &str) -> Vec<u8> {
    serde_json::to_vec(&SaveRequest {
        recipe: model.recipe.clone(),
        save_key: key.to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_save_round_trip() {
    let app = app();
    let mut model = create_and_open(&app, 1).await;
    model.recipe.title = "Lentil soup".to_string();
    model.recipe.ingredients.elems.push(EditableElem::temp(-1, "lentils"));

    let (status, body) = send(
        &app,
        request("POST", "/recipe/save", Some(1), save_body(&model, &model.initial_save_key)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let raw: serde_json::Value = json(&body);
    assert!(raw["newSaveKey"].is_string());
    assert!(raw["mappedIngredients"]["-1"].is_i64());

    let success: SaveSuccess = json(&body);
    assert_eq!(success.mapped_ingredients.len(), 1);
    assert!(success.mapped_directions.is_empty());
}

#[tokio::test]
async fn test_conflict_body_names_holder() {
    let app = app();
    let model = create_and_open(&app, 1).await;
    let uri = model.view_uri.replace("view", "edit");

    // bob takes over the editor
    let (status, _) = send(&app, request("GET", &uri, Some(2), Vec::new())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request("POST", "/recipe/save", Some(1), save_body(&model, &model.initial_save_key)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    match json::<SaveResponse>(&body) {
        SaveResponse::Error(ErrorBody { error }) => assert_eq!(
            error,
            "This recipe is being edited by bob. Reload to continue editing."
        ),
        other => panic!("expected error body, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app();
    let model = create_and_open(&app, 1).await;

    let cases = vec![
        (request("POST", "/recipe/save", Some(1), b"{".to_vec()), StatusCode::BAD_REQUEST, "Bad recipe encoding"),
        (request("POST", "/recipe/create", None, Vec::new()), StatusCode::UNAUTHORIZED, "Not authorized"),
        (request("POST", "/recipe/create", Some(99), Vec::new()), StatusCode::UNAUTHORIZED, "Not authorized"),
        (request("GET", "/recipe/edit?id=abc", Some(1), Vec::new()), StatusCode::BAD_REQUEST, "Bad recipe id"),
        (request("GET", "/recipe/edit?id=999", Some(1), Vec::new()), StatusCode::NOT_FOUND, "Recipe not found"),
        (request("GET", &model.view_uri, None, Vec::new()), StatusCode::NOT_FOUND, "Not found"),
        (request("GET", "/recipe/my_recipes", None, Vec::new()), StatusCode::UNAUTHORIZED, "Not authorized"),
    ];

    for (req, expected, message) in cases {
        let uri = req.uri().to_string();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, expected, "{}", uri);
        assert_eq!(json::<ErrorBody>(&body).error, message, "{}", uri);
    }
}

#[tokio::test]
async fn test_publish_view_delete() {
    let app = app();
    let model = create_and_open(&app, 1).await;

    let (status, _) = send(&app, request("POST", &model.publish_uri, Some(1), Vec::new())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request("GET", "/recipe/published", None, Vec::new())).await;
    assert_eq!(status, StatusCode::OK);
    let published: serde_json::Value = json(&body);
    assert_eq!(published.as_array().map(Vec::len), Some(1));

    let (status, body) = send(&app, request("GET", &model.view_uri, None, Vec::new())).await;
    assert_eq!(status, StatusCode::OK);
    let view: serde_json::Value = json(&body);
    assert_eq!(view["title"], "Untitled");
    assert_eq!(view["canEdit"], false);

    let (status, _) = send(&app, request("POST", &model.delete_uri, Some(1), Vec::new())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, request("GET", &model.view_uri, None, Vec::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
