use std::sync::Arc;

use shared::protocol::UserProfile;

use crate::{
    error::ClientResult,
    gate::{ApiRequest, RequestGate},
    validation::ProfileForm,
};

#[derive(Clone)]
pub struct UsersApi {
    gate: Arc<RequestGate>,
}

impl UsersApi {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self { gate }
    }

    pub async fn profile(&self) -> ClientResult<UserProfile> {
        self.gate.dispatch(ApiRequest::get("user/")).await
    }

    pub async fn update_profile(&self, form: ProfileForm) -> ClientResult<UserProfile> {
        let request = ApiRequest::put("profile/").json(&form.into_update()?)?;
        self.gate.dispatch(request).await
    }
}
