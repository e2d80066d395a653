use std::sync::Arc;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::error::{ApiError, ErrorCode};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
    session::SessionStore,
};

/// Whether the gate may attach the session credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Session,
    /// Never carries the credential. Used by the login and logout calls,
    /// which manage the session themselves.
    Exempt,
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    auth: AuthMode,
    bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            auth: AuthMode::Session,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        let value =
            serde_json::to_value(body).map_err(|err| ClientError::Encode(err.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn exempt(mut self) -> Self {
        self.auth = AuthMode::Exempt;
        self
    }

    /// Token an exempt request carries explicitly. Session requests ignore
    /// it and use the live credential.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn auth(&self) -> AuthMode {
        self.auth
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Single choke point for outbound API calls.
///
/// Non-exempt requests carry `Authorization: Bearer <token>` when a credential
/// is present and are still sent when it is not: the server decides. A 401
/// on a request that carried the live credential evicts the session.
pub struct RequestGate {
    http: Client,
    api_url: Url,
    session: Arc<SessionStore>,
}

impl RequestGate {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> ClientResult<Arc<Self>> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Self::with_client(http, config.api_url.clone(), session))
    }

    pub fn with_client(http: Client, api_url: Url, session: Arc<SessionStore>) -> Arc<Self> {
        Arc::new(Self {
            http,
            api_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.api_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))
    }

    pub async fn dispatch<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// For endpoints whose success body carries nothing the caller needs.
    pub async fn dispatch_unit(&self, request: ApiRequest) -> ClientResult<()> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: ApiRequest) -> ClientResult<Response> {
        let url = self.endpoint(&request.path)?;
        let attached = match request.auth {
            AuthMode::Session => self.session.token().await,
            AuthMode::Exempt => request.bearer.clone(),
        };

        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = attached.is_some(),
            "api: dispatch"
        );

        let mut builder = self.http.request(request.method.clone(), url);
        if let Some(token) = &attached {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder = builder.header(header::ACCEPT, "application/json");

        let response = builder
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && request.auth == AuthMode::Session {
            warn!(path = %request.path, "api: credential rejected");
            if let Some(token) = &attached {
                if !self.session.evict_rejected(token).await && self.session.has_valid().await {
                    return Err(ClientError::StaleCredential);
                }
            }
            return Err(ClientError::Unauthorized);
        }

        Err(remote_error(status, response).await)
    }
}

async fn remote_error(status: StatusCode, response: Response) -> ClientError {
    let raw = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ApiError>(&raw).unwrap_or_else(|_| ApiError {
        detail: (!raw.trim().is_empty()).then(|| raw.trim().to_string()),
        ..ApiError::default()
    });

    if body.kind() == ErrorCode::EmailNotVerified {
        return ClientError::EmailNotVerified {
            email: body.email,
            message: body.message,
        };
    }

    ClientError::Remote {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
#[path = "tests/gate_tests.rs"]
mod tests;
