use std::sync::Arc;

use serde::de::DeserializeOwned;
use shared::protocol::{
    AnalyticsSummary, ComparativeStats, JobTypeShare, LocationShare, OrganizationPerformance,
    RetentionPoint, RevenuePoint, TrendPoint, VerificationStats, WorkerPerformance,
};

use crate::{
    error::ClientResult,
    gate::{ApiRequest, RequestGate},
};

/// Contractor analytics under `contractor/analytics/`.
#[derive(Clone)]
pub struct AnalyticsApi {
    gate: Arc<RequestGate>,
}

/// The figures shown together on the analytics screen.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsOverview {
    pub summary: AnalyticsSummary,
    pub trends: Vec<TrendPoint>,
    pub comparative: ComparativeStats,
    pub verification: VerificationStats,
    pub job_types: Vec<JobTypeShare>,
}

impl AnalyticsApi {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self { gate }
    }

    async fn fetch<T: DeserializeOwned>(&self, report: &str) -> ClientResult<T> {
        self.gate
            .dispatch(ApiRequest::get(format!("contractor/analytics/{report}/")))
            .await
    }

    pub async fn gig_trends(&self) -> ClientResult<Vec<TrendPoint>> {
        self.fetch("gig-trends").await
    }

    pub async fn worker_performance(&self) -> ClientResult<Vec<WorkerPerformance>> {
        self.fetch("worker-performance").await
    }

    pub async fn job_types(&self) -> ClientResult<Vec<JobTypeShare>> {
        self.fetch("job-types").await
    }

    pub async fn organization_performance(&self) -> ClientResult<Vec<OrganizationPerformance>> {
        self.fetch("organization-performance").await
    }

    pub async fn revenue(&self) -> ClientResult<Vec<RevenuePoint>> {
        self.fetch("revenue").await
    }

    pub async fn location(&self) -> ClientResult<Vec<LocationShare>> {
        self.fetch("location").await
    }

    pub async fn verification(&self) -> ClientResult<VerificationStats> {
        self.fetch("verification").await
    }

    pub async fn worker_retention(&self) -> ClientResult<Vec<RetentionPoint>> {
        self.fetch("worker-retention").await
    }

    pub async fn comparative(&self) -> ClientResult<ComparativeStats> {
        self.fetch("comparative").await
    }

    pub async fn summary(&self) -> ClientResult<AnalyticsSummary> {
        self.fetch("summary").await
    }

    /// Fetches the screen's reports concurrently; the first failure wins.
    pub async fn overview(&self) -> ClientResult<AnalyticsOverview> {
        let (summary, trends, comparative, verification, job_types) = tokio::try_join!(
            self.summary(),
            self.gig_trends(),
            self.comparative(),
            self.verification(),
            self.job_types(),
        )?;
        Ok(AnalyticsOverview {
            summary,
            trends,
            comparative,
            verification,
            job_types,
        })
    }
}
