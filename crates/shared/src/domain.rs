use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(SiteId);
id_newtype!(GigId);
id_newtype!(JobTypeId);
id_newtype!(TransactionId);

/// Account kinds accepted by registration. The server encodes them as
/// two-digit strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    #[serde(rename = "01")]
    Supervisor,
    #[serde(rename = "02")]
    Worker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GigStatus {
    Completed,
    Verified,
    Pending,
}

impl GigStatus {
    /// Completion takes precedence over verification.
    pub fn from_flags(is_complete: bool, is_verified: bool) -> Self {
        if is_complete {
            Self::Completed
        } else if is_verified {
            Self::Verified
        } else {
            Self::Pending
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Verified => "Verified",
            Self::Pending => "Pending",
        }
    }
}

/// Three-level administrative location as stored on sites, gigs and profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub constituency: String,
    #[serde(default)]
    pub ward: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.ward, self.constituency, self.county)
    }
}
