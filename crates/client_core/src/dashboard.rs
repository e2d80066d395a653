//! Dashboard aggregation.
//!
//! One cycle issues every slot fetch concurrently and waits for all of them.
//! The cycle commits only when every slot succeeded; otherwise the previous
//! view stays visible and the failure is recorded next to it. Each cycle
//! carries a generation number and a cycle older than the last committed one
//! is dropped instead of overwriting newer data.

use std::{
    collections::{BTreeMap, HashSet},
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use shared::protocol::{
    CalendarDay, ComparativeStats, DashboardStats, RecentGig, TopSite, TopWorker, TrendPoint,
    UserProfile,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    services::{AnalyticsApi, ContractorApi, UsersApi},
    session::SessionStore,
};

/// Items shown per list before it is expanded.
pub const WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Profile,
    Summary,
    RecentGigs,
    TopSites,
    TopWorkers,
    Calendar,
    Trends,
    Comparative,
}

/// Slots rendered as a bounded list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListSlot {
    RecentGigs,
    TopSites,
    TopWorkers,
}

#[derive(Debug, Clone)]
pub enum SlotPayload {
    Profile(UserProfile),
    Summary(DashboardStats),
    RecentGigs(Vec<RecentGig>),
    TopSites(Vec<TopSite>),
    TopWorkers(Vec<TopWorker>),
    Calendar(Vec<CalendarDay>),
    Trends(Vec<TrendPoint>),
    Comparative(ComparativeStats),
}

impl SlotPayload {
    pub fn slot(&self) -> Slot {
        match self {
            SlotPayload::Profile(_) => Slot::Profile,
            SlotPayload::Summary(_) => Slot::Summary,
            SlotPayload::RecentGigs(_) => Slot::RecentGigs,
            SlotPayload::TopSites(_) => Slot::TopSites,
            SlotPayload::TopWorkers(_) => Slot::TopWorkers,
            SlotPayload::Calendar(_) => Slot::Calendar,
            SlotPayload::Trends(_) => Slot::Trends,
            SlotPayload::Comparative(_) => Slot::Comparative,
        }
    }
}

#[async_trait]
pub trait SlotFetcher: Send + Sync {
    async fn fetch(&self) -> ClientResult<SlotPayload>;
}

#[async_trait]
impl<F, Fut> SlotFetcher for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ClientResult<SlotPayload>> + Send,
{
    async fn fetch(&self) -> ClientResult<SlotPayload> {
        (self)().await
    }
}

#[derive(Clone, Default)]
pub struct FetcherSet {
    fetchers: BTreeMap<Slot, Arc<dyn SlotFetcher>>,
}

impl FetcherSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F, Fut>(self, slot: Slot, fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<SlotPayload>> + Send + 'static,
    {
        self.insert_fetcher(slot, Arc::new(fetcher))
    }

    pub fn insert_fetcher(mut self, slot: Slot, fetcher: Arc<dyn SlotFetcher>) -> Self {
        self.fetchers.insert(slot, fetcher);
        self
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    /// The contractor dashboard: profile plus the five dashboard endpoints.
    pub fn contractor(users: UsersApi, contractor: ContractorApi) -> Self {
        let summary = contractor.clone();
        let recent = contractor.clone();
        let sites = contractor.clone();
        let workers = contractor.clone();
        let calendar = contractor;

        Self::new()
            .insert(Slot::Profile, move || {
                let users = users.clone();
                async move { users.profile().await.map(SlotPayload::Profile) }
            })
            .insert(Slot::Summary, move || {
                let api = summary.clone();
                async move { api.stats().await.map(SlotPayload::Summary) }
            })
            .insert(Slot::RecentGigs, move || {
                let api = recent.clone();
                async move { api.recent_gigs().await.map(SlotPayload::RecentGigs) }
            })
            .insert(Slot::TopSites, move || {
                let api = sites.clone();
                async move { api.top_sites().await.map(SlotPayload::TopSites) }
            })
            .insert(Slot::TopWorkers, move || {
                let api = workers.clone();
                async move { api.top_workers().await.map(SlotPayload::TopWorkers) }
            })
            .insert(Slot::Calendar, move || {
                let api = calendar.clone();
                async move { api.calendar().await.map(SlotPayload::Calendar) }
            })
    }

    /// Adds the gig trend series and the period comparison.
    pub fn with_analytics(self, analytics: AnalyticsApi) -> Self {
        let trends = analytics.clone();
        self.insert(Slot::Trends, move || {
            let api = trends.clone();
            async move { api.gig_trends().await.map(SlotPayload::Trends) }
        })
        .insert(Slot::Comparative, move || {
            let api = analytics.clone();
            async move { api.comparative().await.map(SlotPayload::Comparative) }
        })
    }
}

/// A list with a collapsed window of [`WINDOW`] items.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedList<T> {
    full: Vec<T>,
    window: usize,
    expanded: bool,
}

impl<T> BoundedList<T> {
    pub fn new(full: Vec<T>, expanded: bool) -> Self {
        Self {
            full,
            window: WINDOW,
            expanded,
        }
    }

    pub fn visible(&self) -> &[T] {
        if self.expanded {
            &self.full
        } else {
            &self.full[..self.full.len().min(self.window)]
        }
    }

    pub fn all(&self) -> &[T] {
        &self.full
    }

    pub fn has_more(&self) -> bool {
        self.full.len() > self.window
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }
}

impl<T> Default for BoundedList<T> {
    fn default() -> Self {
        Self::new(Vec::new(), false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
    /// Largest value, never below 1.
    pub max: u64,
}

impl ChartSeries {
    pub fn from_calendar(days: &[CalendarDay]) -> Self {
        Self::from_points(
            days.iter()
                .map(|day| ChartPoint {
                    label: day.label(),
                    value: day.gigs,
                })
                .collect(),
        )
    }

    pub fn from_trends(trends: &[TrendPoint]) -> Self {
        Self::from_points(
            trends
                .iter()
                .map(|point| ChartPoint {
                    label: point.period.clone(),
                    value: point.gigs,
                })
                .collect(),
        )
    }

    fn from_points(points: Vec<ChartPoint>) -> Self {
        let max = points.iter().map(|point| point.value).max().unwrap_or(0).max(1);
        Self { points, max }
    }

    /// Bar height relative to the tallest bar.
    pub fn ratio(&self, value: u64) -> f64 {
        value as f64 / self.max as f64
    }
}

impl Default for ChartSeries {
    fn default() -> Self {
        Self::from_calendar(&[])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub profile: Option<UserProfile>,
    pub summary: DashboardStats,
    pub recent_gigs: BoundedList<RecentGig>,
    pub top_sites: BoundedList<TopSite>,
    pub top_workers: BoundedList<TopWorker>,
    pub calendar: Vec<CalendarDay>,
    pub chart: ChartSeries,
    pub trends: Vec<TrendPoint>,
    pub trend_chart: ChartSeries,
    /// Absent when the fetcher set has no comparative slot.
    pub comparative: Option<ComparativeStats>,
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
}

impl DashboardView {
    fn assemble(payloads: Vec<SlotPayload>, expanded: &HashSet<ListSlot>, generation: u64) -> Self {
        let mut view = Self {
            profile: None,
            summary: DashboardStats::default(),
            recent_gigs: BoundedList::default(),
            top_sites: BoundedList::default(),
            top_workers: BoundedList::default(),
            calendar: Vec::new(),
            chart: ChartSeries::default(),
            trends: Vec::new(),
            trend_chart: ChartSeries::default(),
            comparative: None,
            generation,
            loaded_at: Utc::now(),
        };
        for payload in payloads {
            match payload {
                SlotPayload::Profile(profile) => view.profile = Some(profile),
                SlotPayload::Summary(summary) => view.summary = summary,
                SlotPayload::RecentGigs(gigs) => {
                    view.recent_gigs =
                        BoundedList::new(gigs, expanded.contains(&ListSlot::RecentGigs))
                }
                SlotPayload::TopSites(sites) => {
                    view.top_sites = BoundedList::new(sites, expanded.contains(&ListSlot::TopSites))
                }
                SlotPayload::TopWorkers(workers) => {
                    view.top_workers =
                        BoundedList::new(workers, expanded.contains(&ListSlot::TopWorkers))
                }
                SlotPayload::Calendar(days) => {
                    view.chart = ChartSeries::from_calendar(&days);
                    view.calendar = days;
                }
                SlotPayload::Trends(points) => {
                    view.trend_chart = ChartSeries::from_trends(&points);
                    view.trends = points;
                }
                SlotPayload::Comparative(stats) => view.comparative = Some(stats),
            }
        }
        view
    }

    fn set_expanded(&mut self, list: ListSlot, expanded: bool) {
        match list {
            ListSlot::RecentGigs => self.recent_gigs.set_expanded(expanded),
            ListSlot::TopSites => self.top_sites.set_expanded(expanded),
            ListSlot::TopWorkers => self.top_workers.set_expanded(expanded),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    #[error("session is missing or was rejected")]
    Unauthorized,
    #[error("failed to load {slot:?}: {source}")]
    Fetch { slot: Slot, source: ClientError },
    #[error("fetcher for {expected:?} returned {actual:?}")]
    SlotMismatch { expected: Slot, actual: Slot },
}

impl DashboardError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, DashboardError::Unauthorized)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Committed(DashboardView),
    /// A newer cycle committed first; this one's payloads, or its
    /// non-credential failure, were discarded.
    Superseded,
}

#[derive(Default)]
struct DashboardState {
    view: Option<DashboardView>,
    committed_generation: u64,
    last_failure: Option<DashboardError>,
    expanded: HashSet<ListSlot>,
}

pub struct DashboardOrchestrator {
    session: Arc<SessionStore>,
    fetchers: FetcherSet,
    state: RwLock<DashboardState>,
    next_generation: AtomicU64,
}

impl DashboardOrchestrator {
    pub fn new(session: Arc<SessionStore>, fetchers: FetcherSet) -> Arc<Self> {
        Arc::new(Self {
            session,
            fetchers,
            state: RwLock::new(DashboardState::default()),
            next_generation: AtomicU64::new(0),
        })
    }

    pub async fn load_all(&self) -> Result<CycleOutcome, DashboardError> {
        if !self.session.has_valid().await {
            debug!("dashboard: no credential, skipping load");
            self.state.write().await.last_failure = Some(DashboardError::Unauthorized);
            return Err(DashboardError::Unauthorized);
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let results = join_all(self.fetchers.fetchers.iter().map(|(slot, fetcher)| {
            let slot = *slot;
            let fetcher = Arc::clone(fetcher);
            async move { (slot, fetcher.fetch().await) }
        }))
        .await;

        let mut payloads = Vec::with_capacity(results.len());
        let mut failure: Option<DashboardError> = None;
        for (slot, result) in results {
            let error = match result {
                Ok(payload) if payload.slot() == slot => {
                    payloads.push(payload);
                    continue;
                }
                Ok(payload) => DashboardError::SlotMismatch {
                    expected: slot,
                    actual: payload.slot(),
                },
                Err(ClientError::Unauthorized) => DashboardError::Unauthorized,
                Err(source) => DashboardError::Fetch { slot, source },
            };
            if failure.as_ref().map_or(true, |current| {
                !current.is_unauthorized() && error.is_unauthorized()
            }) {
                failure = Some(error);
            }
        }

        let mut state = self.state.write().await;
        // A rejected credential outlives the cycle that saw it, so it is
        // reported even when a newer cycle already committed.
        if let Some(error) = failure.as_ref().filter(|error| error.is_unauthorized()) {
            warn!("dashboard: cycle generation={generation} rejected: {error}");
            state.last_failure = Some(error.clone());
            return Err(error.clone());
        }
        if generation <= state.committed_generation {
            debug!(
                "dashboard: dropping cycle generation={generation} committed={}",
                state.committed_generation
            );
            return Ok(CycleOutcome::Superseded);
        }

        if let Some(error) = failure {
            warn!("dashboard: cycle generation={generation} failed: {error}");
            state.last_failure = Some(error.clone());
            return Err(error);
        }

        let view = DashboardView::assemble(payloads, &state.expanded, generation);
        state.view = Some(view.clone());
        state.committed_generation = generation;
        state.last_failure = None;
        info!(
            "dashboard: committed generation={generation} slots={}",
            self.fetchers.len()
        );
        Ok(CycleOutcome::Committed(view))
    }

    pub async fn refresh(&self) -> Result<CycleOutcome, DashboardError> {
        self.load_all().await
    }

    /// Flips one list between its window and its full length. The flag
    /// survives later refreshes.
    pub async fn toggle_expand(&self, list: ListSlot) -> Option<DashboardView> {
        let mut state = self.state.write().await;
        let expanded = if state.expanded.remove(&list) {
            false
        } else {
            state.expanded.insert(list);
            true
        };
        let view = state.view.as_mut()?;
        view.set_expanded(list, expanded);
        Some(view.clone())
    }

    pub async fn snapshot(&self) -> Option<DashboardView> {
        self.state.read().await.view.clone()
    }

    pub async fn last_failure(&self) -> Option<DashboardError> {
        self.state.read().await.last_failure.clone()
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
