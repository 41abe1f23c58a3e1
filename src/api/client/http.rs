//! HTTP client implementation
//!
//! This module talks to the Fizzy REST API over HTTPS using reqwest.

use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use url::Url;

use super::{location, FizzyApi};
use crate::config::Credentials;
use crate::models::{Board, Card, CardUpdate, Column, Identity};

const USER_AGENT: &str = concat!("fizzy-mcp/", env!("CARGO_PKG_VERSION"));

/// API client configuration
#[derive(Clone)]
pub struct ClientConfig {
    pub token: String,
    pub base_url: String,
    /// Permit plain HTTP to non-loopback hosts (development only)
    pub allow_insecure: bool,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
            allow_insecure: false,
        }
    }

    /// Build from resolved credentials, or `None` when no token is available
    pub fn from_credentials(credentials: &Credentials) -> Option<Self> {
        credentials.token.as_ref().map(|token| Self {
            token: token.clone(),
            base_url: credentials.url.clone(),
            allow_insecure: credentials.dev_mode,
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"****")
            .field("base_url", &self.base_url)
            .field("allow_insecure", &self.allow_insecure)
            .finish()
    }
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Fizzy API URL must use HTTPS for security")]
    InsecureUrl,

    #[error("No Fizzy accounts found for this token")]
    NoAccounts,

    #[error("Fizzy API error: {status} {status_text}")]
    Api { status: u16, status_text: String },

    #[error("Failed to get location from response")]
    MissingLocation,

    #[error("Failed to parse ID from location: {location}")]
    LocationParse { location: String },

    #[error("HTTP error: {0}")]
    Http(#[from] ReqwestError),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reject non-HTTPS base URLs unless they point at the local machine.
///
/// The host is compared after parsing, so `http://evil-localhost.example.com`
/// does not qualify as local. Unparsable URLs are rejected outright.
pub fn ensure_secure_url(base_url: &str, allow_insecure: bool) -> Result<(), ClientError> {
    let parsed = Url::parse(base_url).map_err(|_| ClientError::InsecureUrl)?;
    if parsed.scheme() == "https" {
        return Ok(());
    }
    let loopback = matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1"));
    if parsed.scheme() == "http" && (loopback || allow_insecure) {
        Ok(())
    } else {
        Err(ClientError::InsecureUrl)
    }
}

/// One call against the API
struct RequestOptions<'a> {
    method: Method,
    endpoint: String,
    query: Vec<(&'static str, &'a str)>,
    body: Option<Value>,
    return_location: bool,
}

impl<'a> RequestOptions<'a> {
    fn new(method: Method, endpoint: String) -> Self {
        Self {
            method,
            endpoint,
            query: Vec::new(),
            body: None,
            return_location: false,
        }
    }

    fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn query(mut self, query: Vec<(&'static str, &'a str)>) -> Self {
        self.query = query;
        self
    }

    fn with_location(mut self) -> Self {
        self.return_location = true;
        self
    }
}

/// Successful response: parsed body (if any) and the `Location` header when asked for
struct RawResponse {
    body: Option<Value>,
    location: Option<String>,
}

/// API client for the Fizzy service
pub struct HttpClient {
    http_client: ReqwestClient,
    token: String,
    base_url: String,
    account_slug: OnceCell<String>,
}

impl HttpClient {
    /// Create a client, refusing insecure base URLs
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        ensure_secure_url(&config.base_url, config.allow_insecure)?;
        let http_client = ReqwestClient::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http_client,
            token: config.token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_slug: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, options: RequestOptions<'_>) -> Result<RawResponse, ClientError> {
        let url = format!("{}{}", self.base_url, options.endpoint);
        tracing::debug!(method = %options.method, endpoint = %options.endpoint, "Fizzy API request");

        let mut builder = self
            .http_client
            .request(options.method.clone(), &url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json");
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), endpoint = %options.endpoint, "Fizzy API error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let location = if options.return_location {
            response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        } else {
            None
        };

        let body = if status == StatusCode::NO_CONTENT {
            None
        } else {
            let bytes = response.bytes().await?;
            serde_json::from_slice(&bytes).ok()
        };

        Ok(RawResponse { body, location })
    }

    /// Endpoint path under the account namespace
    async fn scoped(&self, path: &str) -> Result<String, ClientError> {
        let slug = self.account_slug().await?;
        Ok(format!("/{}{}", slug, path))
    }

    async fn get<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T, ClientError> {
        let endpoint = self.scoped(path).await?;
        let response = self.request(RequestOptions::new(Method::GET, endpoint)).await?;
        decode(response.body)
    }

    async fn post_with_location(&self, path: &str, body: Value) -> Result<Option<String>, ClientError> {
        let endpoint = self.scoped(path).await?;
        let response = self
            .request(
                RequestOptions::new(Method::POST, endpoint)
                    .body(body)
                    .with_location(),
            )
            .await?;
        Ok(response.location)
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<(), ClientError> {
        let endpoint = self.scoped(path).await?;
        let mut options = RequestOptions::new(method, endpoint);
        if let Some(body) = body {
            options = options.body(body);
        }
        self.request(options).await?;
        Ok(())
    }
}

/// A missing body decodes to the type's empty value
fn decode<T: DeserializeOwned + Default>(body: Option<Value>) -> Result<T, ClientError> {
    match body {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(T::default()),
    }
}

#[async_trait::async_trait]
impl FizzyApi for HttpClient {
    async fn account_slug(&self) -> Result<String, ClientError> {
        let slug = self
            .account_slug
            .get_or_try_init(|| async move {
                let response = self
                    .request(RequestOptions::new(Method::GET, "/my/identity".to_string()))
                    .await?;
                let identity: Identity = decode(response.body)?;
                if identity.accounts.len() > 1 {
                    tracing::warn!(
                        "Token grants access to {} accounts; using the first one",
                        identity.accounts.len()
                    );
                }
                let account = identity
                    .accounts
                    .into_iter()
                    .next()
                    .ok_or(ClientError::NoAccounts)?;
                tracing::info!(account = %account.name, "Resolved Fizzy account");
                Ok::<_, ClientError>(account.path_segment().to_string())
            })
            .await?;
        Ok(slug.clone())
    }

    async fn list_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.get("/boards").await
    }

    async fn get_board(&self, board_id: &str) -> Result<Board, ClientError> {
        self.get(&format!("/boards/{}", board_id)).await
    }

    async fn create_board(&self, name: &str) -> Result<Board, ClientError> {
        let location = self
            .post_with_location("/boards", json!({ "board": { "name": name } }))
            .await?;
        let board_id = location::board_id(location.as_deref())?;
        self.get_board(&board_id).await
    }

    async fn list_cards(&self, board_ids: &[String]) -> Result<Vec<Card>, ClientError> {
        let endpoint = self.scoped("/cards").await?;
        let query = board_ids
            .iter()
            .map(|id| ("board_ids[]", id.as_str()))
            .collect();
        let response = self
            .request(RequestOptions::new(Method::GET, endpoint).query(query))
            .await?;
        decode(response.body)
    }

    async fn get_card(&self, number: u64) -> Result<Card, ClientError> {
        self.get(&format!("/cards/{}", number)).await
    }

    async fn create_card(
        &self,
        board_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<u64, ClientError> {
        let mut card = json!({ "title": title });
        if let Some(description) = description.filter(|d| !d.is_empty()) {
            card["description"] = json!(description);
        }
        let location = self
            .post_with_location(&format!("/boards/{}/cards", board_id), json!({ "card": card }))
            .await?;
        location::card_number(location.as_deref())
    }

    async fn update_card(&self, number: u64, update: &CardUpdate) -> Result<(), ClientError> {
        let body = json!({ "card": serde_json::to_value(update)? });
        self.send(Method::PUT, &format!("/cards/{}", number), Some(body))
            .await
    }

    async fn close_card(&self, number: u64) -> Result<(), ClientError> {
        self.send(Method::POST, &format!("/cards/{}/closure", number), None)
            .await
    }

    async fn reopen_card(&self, number: u64) -> Result<(), ClientError> {
        self.send(Method::DELETE, &format!("/cards/{}/closure", number), None)
            .await
    }

    async fn add_step(&self, number: u64, content: &str) -> Result<String, ClientError> {
        let location = self
            .post_with_location(
                &format!("/cards/{}/steps", number),
                json!({ "step": { "content": content } }),
            )
            .await?;
        location::step_id(location.as_deref())
    }

    async fn update_step(
        &self,
        number: u64,
        step_id: &str,
        completed: bool,
    ) -> Result<(), ClientError> {
        self.send(
            Method::PUT,
            &format!("/cards/{}/steps/{}", number, step_id),
            Some(json!({ "step": { "completed": completed } })),
        )
        .await
    }

    async fn delete_step(&self, number: u64, step_id: &str) -> Result<(), ClientError> {
        self.send(
            Method::DELETE,
            &format!("/cards/{}/steps/{}", number, step_id),
            None,
        )
        .await
    }

    async fn get_columns(&self, board_id: &str) -> Result<Vec<Column>, ClientError> {
        self.get(&format!("/boards/{}/columns", board_id)).await
    }

    async fn triage_card(&self, number: u64, column_id: &str) -> Result<(), ClientError> {
        self.send(
            Method::POST,
            &format!("/cards/{}/triage", number),
            Some(json!({ "column_id": column_id })),
        )
        .await
    }
}
