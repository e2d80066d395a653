use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{AccountType, GigId, GigStatus, JobTypeId, Location, SiteId, TransactionId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub account_type: AccountType,
}

/// Generic `{message}` acknowledgement several write endpoints return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub constituency: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default, alias = "profile_pic")]
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub national_id: String,
    pub phone: String,
    pub county: String,
    pub constituency: String,
    pub ward: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_gigs: u64,
    pub unverified_gigs: u64,
    pub active_workers: u64,
    pub active_sites: u64,
    pub verified_this_week: u64,
    pub verification_rate: f64,
    pub avg_verification_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentGig {
    pub id: GigId,
    pub worker_name: String,
    pub site_name: String,
    pub job_type: String,
    pub date: String,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSite {
    pub id: SiteId,
    pub name: String,
    #[serde(default)]
    pub workers: u64,
    #[serde(default)]
    pub gigs: u64,
    #[serde(default)]
    pub completion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopWorker {
    pub id: UserId,
    #[serde(default)]
    pub rank: u32,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub gigs: u64,
    #[serde(default)]
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub day_name: Option<String>,
    #[serde(default)]
    pub gigs: u64,
}

impl CalendarDay {
    /// Short weekday label, falling back to the date when the server omits it.
    pub fn label(&self) -> String {
        match &self.day_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.date.format("%a").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub owner: Option<UserId>,
}

/// Body for creating or updating a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePayload {
    pub name: String,
    pub description: String,
    pub phone_number: String,
    #[serde(flatten)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gig {
    pub id: GigId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub duration_value: u32,
    #[serde(default)]
    pub duration_unit: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub amount_paid: Option<Amount>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub worker: Option<UserId>,
    #[serde(default)]
    pub job_type: Option<JobTypeId>,
    #[serde(default)]
    pub logged_by: Option<UserId>,
    #[serde(default)]
    pub verified_by: Option<UserId>,
    #[serde(default)]
    pub organization: Option<SiteId>,
}

impl Gig {
    pub fn status(&self) -> GigStatus {
        GigStatus::from_flags(self.is_complete, self.is_verified)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyGigRequest {
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkPushRequest {
    pub phone_number: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StkPushResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "CheckoutRequestID")]
    pub checkout_request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: TransactionId,
    pub amount: Amount,
    pub mpesa_receipt_number: String,
    pub transaction_date: DateTime<Utc>,
    pub phone_number: String,
    #[serde(default)]
    pub status: String,
}

/// Monetary amount as sent by the server, which uses either JSON numbers or
/// decimal strings such as `"1500.00"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> Option<f64> {
        self.0.trim().parse().ok()
    }

    /// Numeric comparison when both sides parse, exact text otherwise.
    pub fn matches(&self, raw: &str) -> bool {
        match (self.value(), raw.trim().parse::<f64>()) {
            (Some(left), Ok(right)) => (left - right).abs() < f64::EPSILON,
            _ => self.0 == raw,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Amount(text),
            Raw::Number(number) => Amount(number.to_string()),
        })
    }
}

/// One bucket of the gig trend series, usually a week or a month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendPoint {
    #[serde(alias = "date", alias = "month", alias = "week")]
    pub period: String,
    #[serde(alias = "count", alias = "total")]
    pub gigs: u64,
    pub verified: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPerformance {
    pub id: Option<UserId>,
    #[serde(alias = "worker_name")]
    pub name: String,
    #[serde(alias = "total_gigs")]
    pub gigs: u64,
    pub verified_gigs: u64,
    pub rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobTypeShare {
    #[serde(alias = "name")]
    pub job_type: String,
    #[serde(alias = "count")]
    pub gigs: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationPerformance {
    pub id: Option<SiteId>,
    pub name: String,
    pub gigs: u64,
    pub workers: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenuePoint {
    #[serde(alias = "date", alias = "month")]
    pub period: String,
    #[serde(alias = "revenue", alias = "total")]
    pub amount: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationShare {
    #[serde(alias = "location")]
    pub county: String,
    pub gigs: u64,
    pub workers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationStats {
    pub verified: u64,
    pub unverified: u64,
    pub verification_rate: f64,
    pub avg_verification_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPoint {
    #[serde(alias = "month")]
    pub period: String,
    pub active_workers: u64,
    pub returning_workers: u64,
    pub retention_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSummary {
    pub total_gigs: u64,
    pub verified_gigs: u64,
    pub total_workers: u64,
    pub total_sites: u64,
    pub total_revenue: Amount,
    pub verification_rate: f64,
}

/// Figures for one reporting period of the comparative view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodFigures {
    pub gigs: u64,
    pub verified: u64,
    pub workers: u64,
    pub revenue: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparativeStats {
    #[serde(alias = "current_period", alias = "this_month")]
    pub current: PeriodFigures,
    #[serde(alias = "previous_period", alias = "last_month")]
    pub previous: PeriodFigures,
}

/// Change of one figure between the previous and the current period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    pub absolute: f64,
    /// `None` when the previous period was zero.
    pub percent: Option<f64>,
}

impl Delta {
    pub fn between(previous: f64, current: f64) -> Self {
        let absolute = current - previous;
        let percent = (previous != 0.0).then(|| absolute / previous * 100.0);
        Self { absolute, percent }
    }
}

impl ComparativeStats {
    pub fn gigs(&self) -> Delta {
        Delta::between(self.previous.gigs as f64, self.current.gigs as f64)
    }

    pub fn verified(&self) -> Delta {
        Delta::between(self.previous.verified as f64, self.current.verified as f64)
    }

    pub fn workers(&self) -> Delta {
        Delta::between(self.previous.workers as f64, self.current.workers as f64)
    }

    /// Unparseable amounts count as zero.
    pub fn revenue(&self) -> Delta {
        Delta::between(
            self.previous.revenue.value().unwrap_or(0.0),
            self.current.revenue.value().unwrap_or(0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_numbers_and_strings() {
        let record: PaymentRecord = serde_json::from_str(
            r#"{"id":1,"amount":1500,"mpesa_receipt_number":"SHK7G8X9Y2",
                "transaction_date":"2026-01-21T10:30:00Z","phone_number":"254712345678",
                "status":"completed"}"#,
        )
        .expect("decode");
        assert_eq!(record.amount.as_str(), "1500");
        assert!(record.amount.matches("1500.00"));

        let text: Amount = serde_json::from_str("\"2500.50\"").expect("decode");
        assert_eq!(text.value(), Some(2500.5));
        assert!(!text.matches("2500"));
    }

    #[test]
    fn gig_flattens_location_fields() {
        let gig: Gig = serde_json::from_str(
            r#"{"id":3,"start_date":"2025-07-15","duration_value":3,"duration_unit":"weeks",
                "client_name":"Njesh","client_phone":"078121111","county":"Nairobi",
                "constituency":"Westlands","ward":"Parklands","amount_paid":"0.00",
                "is_verified":true,"is_complete":false,"worker":2,"verified_by":null}"#,
        )
        .expect("decode");
        assert_eq!(gig.location.to_string(), "Parklands, Westlands, Nairobi");
        assert_eq!(gig.status(), GigStatus::Verified);
        assert_eq!(gig.verified_by, None);
    }

    #[test]
    fn calendar_label_falls_back_to_weekday() {
        let day = CalendarDay {
            date: NaiveDate::from_ymd_opt(2026, 1, 12).expect("date"),
            day_name: None,
            gigs: 4,
        };
        assert_eq!(day.label(), "Mon");
    }

    #[test]
    fn profile_accepts_profile_pic_alias() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"username":"dennis027","profile_pic":"/media/a.png"}"#)
                .expect("decode");
        assert_eq!(profile.profile_image.as_deref(), Some("/media/a.png"));
    }

    #[test]
    fn trend_points_accept_server_aliases() {
        let points: Vec<TrendPoint> = serde_json::from_str(
            r#"[{"month":"2026-01","count":14,"verified":9},{"period":"2026-02","gigs":3}]"#,
        )
        .expect("decode");
        assert_eq!(points[0].period, "2026-01");
        assert_eq!(points[0].gigs, 14);
        assert_eq!(points[1].verified, 0);
    }

    #[test]
    fn comparative_deltas_guard_empty_previous_period() {
        let stats: ComparativeStats = serde_json::from_str(
            r#"{"current_period":{"gigs":30,"workers":6,"revenue":"4500.00"},
                "previous_period":{"gigs":20,"workers":0,"revenue":3000}}"#,
        )
        .expect("decode");
        assert_eq!(stats.gigs().absolute, 10.0);
        assert_eq!(stats.gigs().percent, Some(50.0));
        assert_eq!(stats.workers().percent, None);
        assert_eq!(stats.revenue().percent, Some(50.0));
        assert_eq!(stats.verified(), Delta { absolute: 0.0, percent: None });
    }
}
