use std::sync::Arc;

use shared::{domain::SiteId, protocol::Site};
use tracing::info;

use crate::{
    error::ClientResult,
    gate::{ApiRequest, RequestGate},
    validation::SiteForm,
};

#[derive(Clone)]
pub struct SitesApi {
    gate: Arc<RequestGate>,
}

impl SitesApi {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self { gate }
    }

    pub async fn list(&self) -> ClientResult<Vec<Site>> {
        self.gate
            .dispatch(ApiRequest::get("user-organizations/"))
            .await
    }

    pub async fn create(&self, form: SiteForm) -> ClientResult<Site> {
        let request = ApiRequest::post("organizations/").json(&form.into_payload()?)?;
        let site: Site = self.gate.dispatch(request).await?;
        info!("sites: created site={} name={}", site.id, site.name);
        Ok(site)
    }

    pub async fn update(&self, id: SiteId, form: SiteForm) -> ClientResult<Site> {
        let request = ApiRequest::put(format!("organizations/{id}/")).json(&form.into_payload()?)?;
        self.gate.dispatch(request).await
    }

    pub async fn delete(&self, id: SiteId) -> ClientResult<()> {
        self.gate
            .dispatch_unit(ApiRequest::delete(format!("organizations/{id}/")))
            .await?;
        info!("sites: deleted site={id}");
        Ok(())
    }
}
