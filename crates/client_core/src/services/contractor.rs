use std::sync::Arc;

use shared::{
    domain::SiteId,
    protocol::{CalendarDay, DashboardStats, Gig, RecentGig, Site, TopSite, TopWorker},
};

use crate::{
    error::ClientResult,
    gate::{ApiRequest, RequestGate},
};

/// Read-only contractor views: dashboard figures and organization listings.
#[derive(Clone)]
pub struct ContractorApi {
    gate: Arc<RequestGate>,
}

impl ContractorApi {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self { gate }
    }

    pub async fn stats(&self) -> ClientResult<DashboardStats> {
        self.gate
            .dispatch(ApiRequest::get("contractor/dashboard/stats/"))
            .await
    }

    pub async fn recent_gigs(&self) -> ClientResult<Vec<RecentGig>> {
        self.gate
            .dispatch(ApiRequest::get("contractor/dashboard/recent-gigs/"))
            .await
    }

    pub async fn top_sites(&self) -> ClientResult<Vec<TopSite>> {
        self.gate
            .dispatch(ApiRequest::get("contractor/dashboard/top-sites/"))
            .await
    }

    pub async fn top_workers(&self) -> ClientResult<Vec<TopWorker>> {
        self.gate
            .dispatch(ApiRequest::get("contractor/dashboard/top-workers/"))
            .await
    }

    pub async fn calendar(&self) -> ClientResult<Vec<CalendarDay>> {
        self.gate
            .dispatch(ApiRequest::get("contractor/dashboard/calendar/"))
            .await
    }

    pub async fn unverified_gigs(&self) -> ClientResult<Vec<Gig>> {
        self.gate
            .dispatch(ApiRequest::get("contractor/dashboard/unverified-gigs/"))
            .await
    }

    pub async fn organizations(&self) -> ClientResult<Vec<Site>> {
        self.gate
            .dispatch(ApiRequest::get("contractor/organizations/"))
            .await
    }

    pub async fn organization_gigs(&self, organization: SiteId) -> ClientResult<Vec<Gig>> {
        self.gate
            .dispatch(ApiRequest::get(format!(
                "contractor/organizations/{organization}/gigs/"
            )))
            .await
    }
}
