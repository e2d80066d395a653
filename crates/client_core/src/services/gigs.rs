use std::sync::Arc;

use shared::{domain::GigId, protocol::VerifyGigRequest};
use tracing::info;

use crate::{
    error::ClientResult,
    gate::{ApiRequest, RequestGate},
};

#[derive(Clone)]
pub struct GigsApi {
    gate: Arc<RequestGate>,
}

impl GigsApi {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self { gate }
    }

    pub async fn verify(&self, id: GigId) -> ClientResult<()> {
        let request = ApiRequest::post(format!("gigs/verify/{id}/"))
            .json(&VerifyGigRequest { is_verified: true })?;
        self.gate.dispatch_unit(request).await?;
        info!("gigs: verified gig={id}");
        Ok(())
    }
}
