//! Form validation as pure functions from raw field values to a per-field
//! report. Nothing here touches the network; a form only becomes a request
//! body once its report is empty.

use std::{collections::BTreeMap, fmt};

use regions::{RegionCatalog, SelectionState};
use serde::Serialize;
use shared::{
    domain::AccountType,
    protocol::{LoginRequest, ProfileUpdate, RegisterRequest, SitePayload, StkPushRequest, UserProfile},
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldError {
    Required,
    InvalidEmail,
    TooShort,
    Mismatch,
    InvalidPhone,
    InvalidAmount,
}

impl FieldError {
    pub fn code(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidEmail => "invalid_email",
            Self::TooShort => "too_short",
            Self::Mismatch => "mismatch",
            Self::InvalidPhone => "invalid_phone",
            Self::InvalidAmount => "invalid_amount",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: BTreeMap<&'static str, FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<FieldError> {
        self.errors.get(field).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldError)> + '_ {
        self.errors.iter().map(|(field, err)| (*field, *err))
    }

    fn reject(&mut self, field: &'static str, err: FieldError) {
        self.errors.entry(field).or_insert(err);
    }

    fn require(&mut self, field: &'static str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.reject(field, FieldError::Required);
            false
        } else {
            true
        }
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationReport> {
        if self.is_valid() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, err) in &self.errors {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {}", err.code())?;
            first = false;
        }
        Ok(())
    }
}

fn strip_phone_punctuation(raw: &str) -> String {
    raw.chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect()
}

/// Kenyan mobile numbers in the three local spellings: `2547XXXXXXXX`,
/// `07XXXXXXXX` and the bare nine-digit subscriber number.
pub fn is_valid_phone(raw: &str) -> bool {
    let cleaned = strip_phone_punctuation(raw);
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    if cleaned.starts_with("254") {
        cleaned.len() == 12
    } else if cleaned.starts_with('0') {
        cleaned.len() == 10
    } else if cleaned.starts_with('7') || cleaned.starts_with('1') {
        cleaned.len() == 9
    } else {
        false
    }
}

/// Rewrites a phone number into the `254…` form the payment gateway expects.
pub fn normalize_msisdn(raw: &str) -> Option<String> {
    let cleaned = strip_phone_punctuation(raw);
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if !is_valid_phone(cleaned) {
        return None;
    }

    Some(if let Some(rest) = cleaned.strip_prefix('0') {
        format!("254{rest}")
    } else if cleaned.starts_with("254") {
        cleaned.to_string()
    } else {
        format!("254{cleaned}")
    })
}

/// Inverse of [`normalize_msisdn`] for display.
pub fn display_msisdn(msisdn: &str) -> String {
    match msisdn.strip_prefix("254") {
        Some(rest) => format!("0{rest}"),
        None => msisdn.to_string(),
    }
}

pub fn is_valid_email(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.require("username", &self.username);
        report.require("password", &self.password);
        report
    }

    pub fn into_request(self) -> Result<LoginRequest, ValidationReport> {
        self.validate().into_result(|| LoginRequest {
            identifier: self.username.trim().to_string(),
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub account_type: AccountType,
}

impl RegisterForm {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.require("username", &self.username);
        if report.require("email", &self.email) && !is_valid_email(&self.email) {
            report.reject("email", FieldError::InvalidEmail);
        }
        if report.require("password", &self.password)
            && self.password.chars().count() < MIN_PASSWORD_LEN
        {
            report.reject("password", FieldError::TooShort);
        }
        if report.require("confirm_password", &self.confirm_password)
            && self.confirm_password != self.password
        {
            report.reject("confirm_password", FieldError::Mismatch);
        }
        report
    }

    pub fn into_request(self) -> Result<RegisterRequest, ValidationReport> {
        self.validate().into_result(|| RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
            confirm_password: self.confirm_password,
            account_type: self.account_type,
        })
    }
}

/// Location is optional on a site, but once a county is picked the selection
/// has to be carried down to a ward.
#[derive(Debug, Clone, Default)]
pub struct SiteForm {
    pub name: String,
    pub description: String,
    pub phone_number: String,
    pub location: SelectionState,
}

impl SiteForm {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.require("name", &self.name);
        report.require("phone_number", &self.phone_number);
        if !self.location.region().is_empty() {
            report.require("constituency", self.location.sub_region());
            report.require("ward", self.location.ward());
        }
        report
    }

    pub fn into_payload(self) -> Result<SitePayload, ValidationReport> {
        self.validate().into_result(|| SitePayload {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            location: self.location.location(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub full_name: String,
    pub national_id: String,
    pub phone: String,
    pub location: SelectionState,
}

impl ProfileForm {
    /// Pre-populates the form from the server's copy of the profile.
    pub fn from_profile(profile: &UserProfile, catalog: &RegionCatalog) -> Self {
        let saved = shared::domain::Location {
            county: profile.county.clone().unwrap_or_default(),
            constituency: profile.constituency.clone().unwrap_or_default(),
            ward: profile.ward.clone().unwrap_or_default(),
        };
        Self {
            full_name: profile.full_name.clone().unwrap_or_default(),
            national_id: profile.national_id.clone().unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
            location: SelectionState::restore(catalog, &saved),
        }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.require("full_name", &self.full_name);
        report.require("national_id", &self.national_id);
        if report.require("phone", &self.phone) && !is_valid_phone(&self.phone) {
            report.reject("phone", FieldError::InvalidPhone);
        }
        report.require("county", self.location.region());
        report.require("constituency", self.location.sub_region());
        report.require("ward", self.location.ward());
        report
    }

    pub fn into_update(self) -> Result<ProfileUpdate, ValidationReport> {
        self.validate().into_result(|| {
            let location = self.location.location();
            ProfileUpdate {
                full_name: self.full_name.trim().to_string(),
                national_id: self.national_id.trim().to_string(),
                phone: self.phone.trim().to_string(),
                county: location.county,
                constituency: location.constituency,
                ward: location.ward,
            }
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentForm {
    pub phone_number: String,
    pub amount: String,
}

impl PaymentForm {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        if report.require("phone_number", &self.phone_number)
            && normalize_msisdn(&self.phone_number).is_none()
        {
            report.reject("phone_number", FieldError::InvalidPhone);
        }
        if report.require("amount", &self.amount) && self.parsed_amount().is_none() {
            report.reject("amount", FieldError::InvalidAmount);
        }
        report
    }

    fn parsed_amount(&self) -> Option<f64> {
        self.amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite() && *amount > 0.0)
    }

    pub fn into_request(self) -> Result<StkPushRequest, ValidationReport> {
        let report = self.validate();
        match (normalize_msisdn(&self.phone_number), self.parsed_amount()) {
            (Some(phone_number), Some(amount)) if report.is_valid() => Ok(StkPushRequest {
                phone_number,
                amount,
            }),
            _ => Err(report),
        }
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
