use std::sync::Arc;

use shared::protocol::{Acknowledgement, LoginResponse, LogoutRequest};
use tracing::{info, warn};

use crate::{
    error::{ClientError, ClientResult},
    gate::{ApiRequest, RequestGate},
    session::Credentials,
    validation::{LoginForm, RegisterForm},
};

#[derive(Clone)]
pub struct AuthApi {
    gate: Arc<RequestGate>,
}

impl AuthApi {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self { gate }
    }

    /// Exchanges credentials for a token pair and stores it. A response
    /// missing either token leaves the session untouched.
    pub async fn login(&self, form: LoginForm) -> ClientResult<()> {
        let request = ApiRequest::post("login/")
            .json(&form.into_request()?)?
            .exempt();
        let response: LoginResponse = self.gate.dispatch(request).await?;

        let (Some(access_token), Some(refresh_token)) = (response.access, response.refresh) else {
            return Err(ClientError::Decode(
                "login response is missing the access or refresh token".into(),
            ));
        };

        self.gate
            .session()
            .set(Credentials {
                access_token,
                refresh_token: Some(refresh_token),
            })
            .await?;
        info!("auth: signed in");
        Ok(())
    }

    /// Revokes the refresh token, authenticating with the current access
    /// token. The local session is cleared whether or not the server
    /// accepted the logout.
    pub async fn logout(&self) -> ClientResult<()> {
        let session = self.gate.session();
        let body = LogoutRequest {
            refresh: session.refresh_token().await,
        };
        let access = session.token().await;
        let result = match ApiRequest::post("logout/").json(&body) {
            Ok(request) => {
                let request = request.exempt();
                let request = match access {
                    Some(token) => request.bearer(token),
                    None => request,
                };
                self.gate.dispatch_unit(request).await
            }
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            warn!("auth: server logout failed: {err}");
        }
        session.clear().await;
        result
    }

    pub async fn register(&self, form: RegisterForm) -> ClientResult<Acknowledgement> {
        let request = ApiRequest::post("register/")
            .json(&form.into_request()?)?
            .exempt();
        self.gate.dispatch(request).await
    }
}
