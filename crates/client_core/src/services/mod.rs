//! Typed wrappers over the remote API, one per resource family. Every call
//! goes through the [`RequestGate`](crate::gate::RequestGate).

mod analytics;
mod auth;
mod contractor;
mod gigs;
mod payments;
mod sites;
mod users;

pub use analytics::{AnalyticsApi, AnalyticsOverview};
pub use auth::AuthApi;
pub use contractor::ContractorApi;
pub use gigs::GigsApi;
pub use payments::{PaymentFilter, PaymentsApi};
pub use sites::SitesApi;
pub use users::UsersApi;

#[cfg(test)]
#[path = "../tests/services_tests.rs"]
mod tests;
