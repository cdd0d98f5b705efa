//! API client for the parking reservation service.
//!
//! `ApiClient` is built once at startup and shared by every caller. It can
//! carry two hooks: a bearer-token injector reading from a
//! `CredentialStore`, and an `AuthFailureHandler` run on 401 responses.

use std::fmt;
use std::sync::Arc;

use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::config::ClientConfig;
use crate::models::{
    HealthStatus, NewParkingSpot, NewReservation, ParkingSpot, Reservation,
};

use super::error::{ApiError, Result};
use super::hooks::AuthFailureHandler;

/// Assembles an `ApiClient` with the hooks it should run.
pub struct ApiClientBuilder {
    config: ClientConfig,
    credentials: Option<CredentialStore>,
    on_unauthorized: Option<Arc<dyn AuthFailureHandler>>,
}

impl ApiClientBuilder {
    /// Attach `Authorization: Bearer <token>` from this store to every request
    pub fn with_credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Run `handler` whenever the server answers 401
    pub fn on_unauthorized(mut self, handler: impl AuthFailureHandler + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        debug!(
            base_url = %self.config.base_url,
            bearer_auth = self.credentials.is_some(),
            logout_on_401 = self.on_unauthorized.is_some(),
            "API client configured"
        );

        Ok(ApiClient {
            client,
            config: self.config,
            credentials: self.credentials,
            on_unauthorized: self.on_unauthorized,
        })
    }
}

/// Client for the parking reservation API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// and the hooks are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    credentials: Option<CredentialStore>,
    on_unauthorized: Option<Arc<dyn AuthFailureHandler>>,
}

impl ApiClient {
    /// Create a client with no hooks installed
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            credentials: None,
            on_unauthorized: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> Option<&CredentialStore> {
        self.credentials.as_ref()
    }

    /// Start a request against `path`, relative to the base URL.
    /// The stored credential, if any, is attached here.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.config.url_for(path));
        self.authorize(builder)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let Some(credentials) = &self.credentials else {
            return builder;
        };
        let token = match credentials.get() {
            Some(token) if !token.is_empty() => token,
            _ => return builder,
        };
        match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                builder.header(header::AUTHORIZATION, value)
            }
            Err(_) => {
                warn!("Stored credential is not a valid header value, sending without it");
                builder
            }
        }
    }

    fn handle_unauthorized(&self) {
        if let Some(handler) = &self.on_unauthorized {
            handler.on_unauthorized();
        }
    }

    /// Send a request built with [`ApiClient::request`].
    ///
    /// Non-2xx responses become errors. A 401 runs the unauthorized hook
    /// first; the error is returned either way.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                if e.status() == Some(StatusCode::UNAUTHORIZED) {
                    self.handle_unauthorized();
                }
                return Err(e.into());
            }
        };

        let status = response.status();
        debug!(url = %response.url(), status = %status, "Response received");
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Self::parse_json(response, path).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        Self::parse_json(response, path).await
    }

    // ===== Service Endpoints =====

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get("/health").await
    }

    /// Fetch all spots, ordered by spot number
    pub async fn list_spots(&self) -> Result<Vec<ParkingSpot>> {
        self.get("/spots").await
    }

    /// Create a spot. Fails with `Conflict` if the number is taken.
    pub async fn create_spot(&self, spot: &NewParkingSpot) -> Result<ParkingSpot> {
        self.post("/spots", spot).await
    }

    /// Fetch reservations ordered by start time, optionally for one spot
    pub async fn list_reservations(&self, spot_id: Option<i64>) -> Result<Vec<Reservation>> {
        let path = "/reservations";
        let mut builder = self.request(Method::GET, path);
        if let Some(spot_id) = spot_id {
            builder = builder.query(&[("spot_id", spot_id)]);
        }
        let response = self.send(builder).await?;
        Self::parse_json(response, path).await
    }

    /// Book a spot. Fails with `NotFound` for an unknown spot and
    /// `Conflict` when the window overlaps an existing reservation.
    pub async fn create_reservation(&self, reservation: &NewReservation) -> Result<Reservation> {
        self.post("/reservations", reservation).await
    }

    pub async fn delete_reservation(&self, reservation_id: i64) -> Result<()> {
        let path = format!("/reservations/{}", reservation_id);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("bearer_auth", &self.credentials.is_some())
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LogoutOnUnauthorized;
    use httpmock::Method::{DELETE, GET, POST};
    use httpmock::MockServer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn plain_client(server: &MockServer) -> ApiClient {
        ApiClient::new(ClientConfig::resolve(Some(server.base_url().as_str()))).unwrap()
    }

    fn full_client(base_url: &str, credentials: &CredentialStore) -> (ApiClient, Arc<AtomicUsize>) {
        let reloads = Arc::new(AtomicUsize::new(0));
        let counter = reloads.clone();
        let handler = LogoutOnUnauthorized::new(credentials.clone()).with_reload(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let client = ApiClient::builder(ClientConfig::resolve(Some(base_url)))
            .with_credentials(credentials.clone())
            .on_unauthorized(handler)
            .build()
            .unwrap();
        (client, reloads)
    }

    #[test]
    fn test_base_url_from_config() {
        let config = ClientConfig::resolve(Some("https://api.example.com"));
        let client = ApiClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");

        let client = ApiClient::new(ClientConfig::resolve(Some(""))).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_request_carries_bearer_token() {
        let credentials = CredentialStore::in_memory();
        credentials.set("abc123").unwrap();
        let client = ApiClient::builder(ClientConfig::default())
            .with_credentials(credentials)
            .build()
            .unwrap();

        let request = client.request(Method::GET, "/spots").build().unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8000/spots");
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer abc123"
        );
    }

    #[test]
    fn test_request_reads_credential_each_time() {
        let credentials = CredentialStore::in_memory();
        let client = ApiClient::builder(ClientConfig::default())
            .with_credentials(credentials.clone())
            .build()
            .unwrap();

        let request = client.request(Method::GET, "/spots").build().unwrap();
        assert!(request.headers().get(header::AUTHORIZATION).is_none());

        credentials.set("later").unwrap();
        let request = client.request(Method::GET, "/spots").build().unwrap();
        assert_eq!(request.headers().get(header::AUTHORIZATION).unwrap(), "Bearer later");

        // Empty credential is the same as none
        credentials.set("").unwrap();
        let request = client.request(Method::GET, "/spots").build().unwrap();
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_no_credential_hook_sends_no_header() {
        let client = ApiClient::new(ClientConfig::default()).unwrap();
        let request = client.request(Method::GET, "/spots").build().unwrap();
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_credential_is_skipped() {
        let credentials = CredentialStore::in_memory();
        credentials.set("bad\ntoken").unwrap();
        let client = ApiClient::builder(ClientConfig::default())
            .with_credentials(credentials)
            .build()
            .unwrap();

        let request = client.request(Method::GET, "/spots").build().unwrap();
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_list_spots_sends_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/spots")
                    .header("authorization", "Bearer abc123");
                then.status(200)
                    .json_body(serde_json::json!([
                        {"id": 1, "spot_number": "A-1", "active": true},
                        {"id": 2, "spot_number": "A-2", "active": false}
                    ]));
            })
            .await;

        let credentials = CredentialStore::in_memory();
        credentials.set("abc123").unwrap();
        let (client, reloads) = full_client(&server.base_url(), &credentials);

        let spots = client.list_spots().await.unwrap();
        mock.assert_async().await;
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[1].spot_number, "A-2");
        assert_eq!(reloads.load(Ordering::SeqCst), 0);
        assert!(credentials.is_logged_in());
    }

    #[tokio::test]
    async fn test_unauthorized_logs_out_and_reloads_once() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/reservations");
                then.status(401)
                    .json_body(serde_json::json!({"detail": "Not authenticated"}));
            })
            .await;

        let credentials = CredentialStore::in_memory();
        credentials.set("expired").unwrap();
        let (client, reloads) = full_client(&server.base_url(), &credentials);

        let err = client.list_reservations(None).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(credentials.get(), None);
        assert_eq!(reloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forbidden_and_server_error_keep_session() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/spots");
                then.status(403)
                    .json_body(serde_json::json!({"detail": "Admins only"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(500).body("boom");
            })
            .await;

        let credentials = CredentialStore::in_memory();
        credentials.set("abc123").unwrap();
        let (client, reloads) = full_client(&server.base_url(), &credentials);

        let err = client.list_spots().await.unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(ref m) if m == "Admins only"));
        assert_eq!(err.status(), Some(403));

        let err = client.health().await.unwrap_err();
        assert_eq!(err.status(), Some(500));

        assert_eq!(credentials.get().as_deref(), Some("abc123"));
        assert_eq!(reloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_without_handler_only_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/spots");
                then.status(401);
            })
            .await;

        let credentials = CredentialStore::in_memory();
        credentials.set("abc123").unwrap();
        let client = ApiClient::builder(ClientConfig::resolve(Some(server.base_url().as_str())))
            .with_credentials(credentials.clone())
            .build()
            .unwrap();

        assert!(client.list_spots().await.unwrap_err().is_unauthorized());
        assert_eq!(credentials.get().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_list_reservations_filters_by_spot() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/reservations").query_param("spot_id", "3");
                then.status(200).json_body(serde_json::json!([{
                    "id": 9, "name": "Lin", "household": "5F-2", "phone": "0912",
                    "spot_id": 3,
                    "start_time": "2024-05-01T09:00:00",
                    "end_time": "2024-05-01T11:00:00"
                }]));
            })
            .await;

        let client = plain_client(&server);
        let reservations = client.list_reservations(Some(3)).await.unwrap();
        mock.assert_async().await;
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].id, 9);
    }

    #[tokio::test]
    async fn test_create_spot_conflict() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/spots")
                    .json_body(serde_json::json!({"spot_number": "A-1", "active": true}));
                then.status(409)
                    .json_body(serde_json::json!({"detail": "Spot number already exists"}));
            })
            .await;

        let client = plain_client(&server);
        let err = client.create_spot(&NewParkingSpot::new("A-1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Conflict: Spot number already exists");
    }

    #[tokio::test]
    async fn test_delete_reservation_no_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/reservations/42");
                then.status(204);
            })
            .await;

        let client = plain_client(&server);
        client.delete_reservation(42).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).body("<html>");
            })
            .await;

        let client = plain_client(&server);
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert_eq!(err.status(), None);
    }
}
