//! Server Command Wrappers
//!
//! Client bindings to the recipe server's HTTP endpoints.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{EditorModel, ErrorBody, MyRecipes, RecipeSummary, RecipeView, SaveRequest, SaveSuccess};
use crate::session::SaveTransport;

/// Header the authenticating proxy uses to pass the user id
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer, with the server's error message
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Bad response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rejected locally before sending
    #[error("{0}")]
    Invalid(String),

    #[error("A save is already in progress")]
    SaveInFlight,
}

impl ClientError {
    /// Another editor holds the recipe
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Status { status: 409, .. })
    }

    /// The server was busy, retrying may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Status { status: 503, .. })
    }
}

/// HTTP client for one server and one user
#[derive(Debug, Clone)]
pub struct RecipeClient {
    http: reqwest::Client,
    origin: String,
    base_uri: String,
    user_id: Option<i64>,
}

impl RecipeClient {
    /// `origin` is scheme and host (`http://127.0.0.1:8080`), `base_uri`
    /// the server's route prefix (`/recipe`)
    pub fn new(origin: &str, base_uri: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            origin: origin.trim_end_matches('/').to_string(),
            base_uri: base_uri.trim_end_matches('/').to_string(),
            user_id: None,
        }
    }

    /// Act as `uid`
    pub fn with_user(mut self, uid: i64) -> Self {
        self.user_id = Some(uid);
        self
    }

    /// Absolute URL for a server path such as `/recipe/save`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    fn endpoint(&self, name: &str) -> String {
        self.url(&format!("{}/{}", self.base_uri, name))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.user_id {
            Some(uid) => builder.header(USER_HEADER, uid.to_string()),
            None => builder,
        }
    }

    // ========================
    // Recipe Commands
    // ========================

    pub async fn list_published(&self) -> Result<Vec<RecipeSummary>, ClientError> {
        let resp = self.request(Method::GET, &self.endpoint("published")).send().await?;
        read_json(resp).await
    }

    pub async fn my_recipes(&self) -> Result<MyRecipes, ClientError> {
        let resp = self.request(Method::GET, &self.endpoint("my_recipes")).send().await?;
        read_json(resp).await
    }

    /// Create a recipe and open it for editing
    pub async fn create_recipe(&self) -> Result<EditorModel, ClientError> {
        // the server redirects to the editor of the new recipe
        let resp = self.request(Method::POST, &self.endpoint("create")).send().await?;
        read_json(resp).await
    }

    /// Open the editor, superseding any other open editor
    pub async fn open_editor(&self, id: i64) -> Result<EditorModel, ClientError> {
        let url = format!("{}?id={}", self.endpoint("edit"), id);
        let resp = self.request(Method::GET, &url).send().await?;
        read_json(resp).await
    }

    pub async fn save(&self, save_uri: &str, request: &SaveRequest) -> Result<SaveSuccess, ClientError> {
        let resp = self
            .request(Method::POST, &self.url(save_uri))
            .json(request)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn set_published(&self, id: i64, published: bool) -> Result<RecipeSummary, ClientError> {
        let url = format!("{}?id={}&published={}", self.endpoint("publish"), id, published);
        let resp = self.request(Method::POST, &url).send().await?;
        read_json(resp).await
    }

    pub async fn delete_recipe(&self, id: i64) -> Result<(), ClientError> {
        let url = format!("{}?id={}", self.endpoint("delete"), id);
        let resp = self.request(Method::POST, &url).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn view_recipe(&self, id: i64) -> Result<RecipeView, ClientError> {
        let url = format!("{}?id={}", self.endpoint("view"), id);
        let resp = self.request(Method::GET, &url).send().await?;
        read_json(resp).await
    }
}

#[async_trait]
impl SaveTransport for RecipeClient {
    async fn save(&self, save_uri: &str, request: &SaveRequest) -> Result<SaveSuccess, ClientError> {
        RecipeClient::save(self, save_uri, request).await
    }
}

async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.bytes().await?;
    let error = status_error(status.as_u16(), &body);
    warn!(status = status.as_u16(), error = %error, "request rejected");
    Err(error)
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = check_status(resp).await?;
    let body = resp.bytes().await?;
    debug!(len = body.len(), "response received");
    Ok(serde_json::from_slice(&body)?)
}

/// Error for a non-2xx answer; falls back to the raw body when it is not
/// an error object
fn status_error(status: u16, body: &[u8]) -> ClientError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => error,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    };
    ClientError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_urls() {
        let client = RecipeClient::new("http://localhost:8080/", "/recipe/");
        assert_eq!(client.endpoint("save"), "http://localhost:8080/recipe/save");
        assert_eq!(client.url("/recipe/view?id=3"), "http://localhost:8080/recipe/view?id=3");

        let root = RecipeClient::new("http://localhost:8080", "");
        assert_eq!(root.endpoint("published"), "http://localhost:8080/published");
    }

    #[test]
    fn test_status_error_uses_server_message() {
        let err = status_error(409, br#"{"error":"This recipe is being edited by bob. Reload to continue editing."}"#);
        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "This recipe is being edited by bob. Reload to continue editing."
        );

        let err = status_error(503, b"upstream down\n");
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "upstream down");
    }
}
