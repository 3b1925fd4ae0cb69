//! HTTP client for the OneSid backend API.

use std::sync::RwLock;

use async_trait::async_trait;
use onesid_core::model::{AcknowledgeRequest, LoginRequest, SubmissionBatch};
use onesid_core::{
    AuthMode, ClientConfig, LoginResponse, NewProcess, NewUser, PanelUpdate, ProcessRecord,
    Profile, RelevantItem, Routes, StatusMessage, SubmissionRecord, User, UserPreference,
};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::{ApiError, ApiResult, Backend, error_message_from_body};

/// What a 401 means for a given call.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Unauthorized {
    /// Credentials rejected at login; report the backend's message.
    BadCredentials,
    /// Anywhere else: the session is gone.
    SessionExpired,
}

/// HTTP client for the OneSid backend.
///
/// In [`AuthMode::Bearer`] every request carries `Authorization: Bearer <token>`
/// once a token is installed with [`Backend::set_token`]. In
/// [`AuthMode::Cookie`] the client keeps a cookie jar and the backend's session
/// cookie rides along on its own.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth: AuthMode,
    routes: Routes,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Build a client from config. `base_url` should be like
    /// `http://localhost:5000/api`; a trailing slash is dropped.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout());
        if config.auth == AuthMode::Cookie {
            builder = builder.cookie_store(true);
        }
        let client = builder.build().map_err(from_reqwest)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth: config.auth,
            routes: config.routes.clone(),
            token: RwLock::new(None),
        })
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }

    fn current_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match (self.auth, self.current_token()) {
            (AuthMode::Bearer, Some(token)) => req.bearer_auth(token),
            _ => req,
        }
    }

    /// Send a prepared request and return the raw body of a 2xx response.
    async fn execute(&self, req: RequestBuilder, on_401: Unauthorized) -> ApiResult<Vec<u8>> {
        let resp = self.authorize(req).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(from_reqwest)?.to_vec();

        if status.is_success() {
            return Ok(body);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED && on_401 == Unauthorized::SessionExpired {
            warn!("backend answered 401, session expired");
            return Err(ApiError::SessionExpired);
        }
        let message = error_message_from_body(status.as_u16(), &body);
        debug!(status = status.as_u16(), message = %message, "backend error");
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Issue `method route` with an optional JSON body and decode the JSON reply.
    pub async fn request<B, T>(&self, method: Method, route: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.send(method, route, body, Unauthorized::SessionExpired).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send<B>(
        &self,
        method: Method,
        route: &str,
        body: Option<&B>,
        on_401: Unauthorized,
    ) -> ApiResult<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(route);
        debug!(method = %method, url = %url, "backend request");
        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(body);
        }
        self.execute(req, on_401).await
    }

    async fn get<T: DeserializeOwned>(&self, route: &str) -> ApiResult<T> {
        self.request::<(), T>(Method::GET, route, None).await
    }

    /// Mutating calls often answer with an empty body; treat that as no message.
    async fn status_call<B>(&self, method: Method, route: &str, body: Option<&B>) -> ApiResult<StatusMessage>
    where
        B: Serialize + ?Sized,
    {
        let bytes = self.send(method, route, body, Unauthorized::SessionExpired).await?;
        decode_status(&bytes)
    }
}

fn decode_status(bytes: &[u8]) -> ApiResult<StatusMessage> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(StatusMessage::default());
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn from_reqwest(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(Box::new(err))
    }
}

#[async_trait]
impl Backend for ApiClient {
    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        info!(username, "logging in");
        let body = LoginRequest { username, password };
        let bytes = self
            .send(Method::POST, &self.routes.login, Some(&body), Unauthorized::BadCredentials)
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn logout(&self) -> ApiResult<StatusMessage> {
        self.status_call::<()>(Method::POST, &self.routes.logout, None).await
    }

    async fn profile(&self) -> ApiResult<Profile> {
        self.get(&self.routes.profile).await
    }

    async fn painel(&self) -> ApiResult<Vec<ProcessRecord>> {
        let records: Vec<ProcessRecord> = self.get(&self.routes.painel).await?;
        info!(count = records.len(), "fetched panel");
        Ok(records)
    }

    async fn historico(&self) -> ApiResult<Vec<ProcessRecord>> {
        let records: Vec<ProcessRecord> = self.get(&self.routes.historico).await?;
        info!(count = records.len(), "fetched history");
        Ok(records)
    }

    async fn submit_batch(&self, records: &[SubmissionRecord]) -> ApiResult<PanelUpdate> {
        info!(count = records.len(), "submitting batch");
        let body = SubmissionBatch { processos: records };
        self.request(Method::POST, &self.routes.submit_batch, Some(&body))
            .await
    }

    async fn add_process(&self, process: &NewProcess) -> ApiResult<StatusMessage> {
        info!(numero = %process.numero_processo, "adding single process");
        self.status_call(Method::POST, &self.routes.add_process, Some(process))
            .await
    }

    async fn run_monitoring(&self) -> ApiResult<PanelUpdate> {
        info!("triggering monitoring sweep");
        self.request::<(), _>(Method::POST, &self.routes.run_monitoring, None)
            .await
    }

    async fn acknowledge(&self, numero_processo: &str) -> ApiResult<StatusMessage> {
        info!(numero = numero_processo, "acknowledging process");
        let body = AcknowledgeRequest { numero_processo };
        self.status_call(Method::POST, &self.routes.acknowledge, Some(&body))
            .await
    }

    async fn import_legal_one(&self) -> ApiResult<StatusMessage> {
        self.status_call::<()>(Method::POST, &self.routes.import_legal_one, None)
            .await
    }

    async fn relevant_items(&self) -> ApiResult<Vec<RelevantItem>> {
        self.get(&self.routes.relevant_items).await
    }

    async fn save_relevant_items(&self, items: &[RelevantItem]) -> ApiResult<StatusMessage> {
        info!(count = items.len(), "saving relevant items");
        self.status_call(Method::POST, &self.routes.relevant_items, Some(items))
            .await
    }

    async fn import_items(&self, file_name: &str, contents: Vec<u8>) -> ApiResult<StatusMessage> {
        info!(file_name, bytes = contents.len(), "uploading item list");
        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let req = self
            .client
            .post(self.url(&self.routes.import_items))
            .multipart(form);
        let bytes = self.execute(req, Unauthorized::SessionExpired).await?;
        decode_status(&bytes)
    }

    async fn preferences(&self) -> ApiResult<Vec<UserPreference>> {
        self.get(&self.routes.preferences).await
    }

    async fn update_preference(&self, pref: &UserPreference) -> ApiResult<StatusMessage> {
        debug!(id = pref.id, enabled = pref.is_enabled, "updating preference");
        self.status_call(Method::PUT, &self.routes.preferences, Some(pref))
            .await
    }

    async fn users(&self) -> ApiResult<Vec<User>> {
        self.get(&self.routes.users).await
    }

    async fn create_user(&self, user: &NewUser) -> ApiResult<StatusMessage> {
        info!(username = %user.username, role = %user.role, "creating user");
        self.status_call(Method::POST, &self.routes.users, Some(user))
            .await
    }

    async fn export_excel(&self) -> ApiResult<Vec<u8>> {
        let bytes = self
            .send::<()>(Method::GET, &self.routes.export_excel, None, Unauthorized::SessionExpired)
            .await?;
        info!(bytes = bytes.len(), "downloaded spreadsheet export");
        Ok(bytes)
    }

    async fn export_json(&self) -> ApiResult<serde_json::Value> {
        self.get(&self.routes.export_json).await
    }
}
