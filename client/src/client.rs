//! Booking backend API client implementation

use crate::{
    booking::{
        Event, EventProduct, EventResponses, EventStatus, NewEvent, NewEventProduct,
        PaymentRequest, PaymentResult, StatusUpdate,
    },
    config::ClientConfig,
    error::{ApiError, ConfigError},
    flow::{BookingFlow, CatalogProduct, Step, StepRecord},
    resources::Resource,
    session::Session,
    types::{EventId, EventTypeId, FlowId, Listing, Page},
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token refresh endpoint
pub const REFRESH_PATH: &str = "/auth/token/refresh/";

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Serialize)]
struct FlowQuery {
    event_type: EventTypeId,
    is_active: bool,
}

/// Filters for the product catalog
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProductQuery {
    /// Page number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Active filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Booking backend API client
///
/// Cheap to clone; clones share the HTTP connection pool and the [`Session`].
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            session: Arc::new(Session::new(
                config.access_token.clone(),
                config.refresh_token.clone(),
            )),
        })
    }

    /// Create a client from `BOOKFLOW_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(&ClientConfig::from_env()?)
    }

    /// Session shared by all clones of this client
    #[must_use]
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ------------------------------------------------------------------------
    // Booking flow
    // ------------------------------------------------------------------------

    /// Active flows for an event type
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    pub async fn active_flows(&self, event_type: EventTypeId) -> Result<Vec<BookingFlow>, ApiError> {
        let query = FlowQuery {
            event_type,
            is_active: true,
        };
        let listing: Listing<BookingFlow> = self
            .request_json(Method::GET, "/bookingflow/flows/", |r| r.query(&query))
            .await?;
        Ok(listing.into_vec())
    }

    /// Steps of a flow, in backend order
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    pub async fn flow_steps(&self, flow: FlowId) -> Result<Vec<Step>, ApiError> {
        let path = format!("/bookingflow/flows/{flow}/steps/");
        let listing: Listing<StepRecord> = self.request_json(Method::GET, &path, |r| r).await?;
        Ok(listing.into_vec().into_iter().map(Step::from).collect())
    }

    // ------------------------------------------------------------------------
    // Events and payments
    // ------------------------------------------------------------------------

    /// Create an event
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the backend rejects the payload.
    pub async fn create_event(&self, event: &NewEvent) -> Result<Event, ApiError> {
        self.request_json(Method::POST, "/events/events/", |r| r.json(event))
            .await
    }

    /// Attach a product to an event
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the backend rejects the payload.
    pub async fn add_event_product(&self, item: &NewEventProduct) -> Result<EventProduct, ApiError> {
        self.request_json(Method::POST, "/events/event-products/", |r| r.json(item))
            .await
    }

    /// Change an event's status
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the event does not exist.
    pub async fn update_event_status(
        &self,
        event: EventId,
        status: EventStatus,
    ) -> Result<Event, ApiError> {
        let path = format!("/events/events/{event}/update-status/");
        let body = StatusUpdate { status };
        self.request_json(Method::POST, &path, |r| r.json(&body))
            .await
    }

    /// Charge a payment for an event
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the payment is refused or the request fails.
    pub async fn process_payment(&self, request: &PaymentRequest) -> Result<PaymentResult, ApiError> {
        self.request_json(Method::POST, "/payments/process/", |r| r.json(request))
            .await
    }

    /// Store questionnaire answers for an existing event
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or status failures.
    pub async fn save_event_responses(&self, responses: &EventResponses) -> Result<(), ApiError> {
        self.execute(
            Method::POST,
            "/questionnaires/responses/save_event_responses/",
            |r| r.json(responses),
        )
        .await?;
        Ok(())
    }

    /// Product catalog
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    pub async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Page<CatalogProduct>, ApiError> {
        self.request_json(Method::GET, "/products/products/", |r| r.query(query))
            .await
    }

    // ------------------------------------------------------------------------
    // Generic resources
    // ------------------------------------------------------------------------

    /// List a resource collection
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    pub async fn list<R: Resource>(&self, query: &R::Query) -> Result<Page<R>, ApiError> {
        self.request_json(Method::GET, R::PATH, |r| r.query(query))
            .await
    }

    /// Create a resource
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the backend rejects the draft.
    pub async fn create<R: Resource>(&self, draft: &R::Draft) -> Result<R, ApiError> {
        self.request_json(Method::POST, R::PATH, |r| r.json(draft))
            .await
    }

    /// Replace a resource
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the resource no longer exists.
    pub async fn update<R: Resource>(&self, entity: &R) -> Result<R, ApiError> {
        let path = format!("{}{}/", R::PATH, entity.id());
        self.request_json(Method::PUT, &path, |r| r.json(entity))
            .await
    }

    /// Delete a resource
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the resource no longer exists.
    pub async fn delete<R: Resource>(&self, id: R::Id) -> Result<(), ApiError> {
        let path = format!("{}{id}/", R::PATH);
        self.execute(Method::DELETE, &path, |r| r).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    async fn request_json<T, F>(&self, method: Method, path: &str, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let response = self.execute(method, path, build).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a request, refreshing the access token once on 401
    #[tracing::instrument(skip(self, method, build), fields(method = %method))]
    async fn execute<F>(&self, method: Method, path: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let mut response = self.dispatch(&method, path, &build).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("Access token rejected, attempting refresh");
            if !self.refresh_access_token().await? {
                return Err(ApiError::Unauthorized);
            }
            response = self.dispatch(&method, path, &build).await?;
        }

        tracing::debug!(status = response.status().as_u16(), "Response received");
        check_status(response, path).await
    }

    async fn dispatch<F>(&self, method: &Method, path: &str, build: &F) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(token) = self.session.access_token().await {
            request = request.bearer_auth(token);
        }

        build(request)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    /// Exchange the refresh token for a new access token
    ///
    /// Returns `false` when there is no refresh token or the backend refused it.
    async fn refresh_access_token(&self) -> Result<bool, ApiError> {
        let Some(refresh) = self.session.refresh_token().await else {
            return Ok(false);
        };

        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(status = response.status().as_u16(), "Token refresh rejected");
            return Ok(false);
        }

        let tokens: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        self.session.update(tokens.access, tokens.refresh).await;

        tracing::info!("Access token refreshed");
        Ok(true)
    }
}

async fn check_status(response: Response, path: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(ApiError::NotFound(path.to_string())),
        StatusCode::BAD_REQUEST => Err(ApiError::Validation(body)),
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        status => Err(ApiError::Api {
            status: status.as_u16(),
            body,
        }),
    }
}
