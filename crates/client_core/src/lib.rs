use std::sync::Arc;

use tracing::info;

pub mod app_bar;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gate;
pub mod routes;
pub mod services;
pub mod session;
pub mod validation;

pub use app_bar::{AppBar, AppBarAction, AppBarGuard, AppBarState};
pub use config::ClientConfig;
pub use dashboard::{
    CycleOutcome, DashboardError, DashboardOrchestrator, DashboardView, FetcherSet, ListSlot, Slot,
};
pub use error::{ClientError, ClientResult};
pub use gate::{ApiRequest, AuthMode, RequestGate};
pub use routes::{guard, GateDecision, Route};
pub use services::{
    AnalyticsApi, AnalyticsOverview, AuthApi, ContractorApi, GigsApi, PaymentFilter, PaymentsApi,
    SitesApi, UsersApi,
};
pub use session::{
    CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore, SessionEvent,
    SessionState, SessionStore,
};

/// Everything a console front end needs, wired to one session and one gate.
#[derive(Clone)]
pub struct ConsoleClient {
    session: Arc<SessionStore>,
    gate: Arc<RequestGate>,
    app_bar: AppBar,
    pub auth: AuthApi,
    pub users: UsersApi,
    pub contractor: ContractorApi,
    pub analytics: AnalyticsApi,
    pub sites: SitesApi,
    pub gigs: GigsApi,
    pub payments: PaymentsApi,
}

impl ConsoleClient {
    /// Restores any persisted credential before the first request.
    pub async fn connect(
        config: &ClientConfig,
        persistence: Arc<dyn CredentialStore>,
    ) -> ClientResult<Self> {
        let session = SessionStore::restore(persistence).await?;
        let gate = RequestGate::new(config, Arc::clone(&session))?;
        info!(
            "client: ready api={} authenticated={}",
            config.api_url,
            session.has_valid().await
        );
        Ok(Self::with_gate(gate))
    }

    pub fn with_gate(gate: Arc<RequestGate>) -> Self {
        Self {
            session: Arc::clone(gate.session()),
            auth: AuthApi::new(Arc::clone(&gate)),
            users: UsersApi::new(Arc::clone(&gate)),
            contractor: ContractorApi::new(Arc::clone(&gate)),
            analytics: AnalyticsApi::new(Arc::clone(&gate)),
            sites: SitesApi::new(Arc::clone(&gate)),
            gigs: GigsApi::new(Arc::clone(&gate)),
            payments: PaymentsApi::new(Arc::clone(&gate)),
            app_bar: AppBar::new(),
            gate,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn gate(&self) -> &Arc<RequestGate> {
        &self.gate
    }

    pub fn app_bar(&self) -> &AppBar {
        &self.app_bar
    }

    pub async fn guard(&self, route: Route) -> GateDecision {
        routes::guard(route, &self.session).await
    }

    pub fn dashboard(&self) -> Arc<DashboardOrchestrator> {
        DashboardOrchestrator::new(
            Arc::clone(&self.session),
            FetcherSet::contractor(self.users.clone(), self.contractor.clone())
                .with_analytics(self.analytics.clone()),
        )
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
