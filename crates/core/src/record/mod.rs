//! Record types stored in the key-value store.
//!
//! Every record is a flat JSON object stored under `<PREFIX><id>`. Fields the
//! types do not model are kept in an `extra` map so a read-modify-write never
//! drops data another client wrote.

mod alert;
mod asset;
mod profile;
mod work_order;

use serde::de::DeserializeOwned;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub use alert::{AlertPriority, AlertStatus, PredictiveAlert};
pub use asset::{Asset, AssetStatus, Coordinates, Criticality, Location};
pub use profile::{UserProfile, DEFAULT_ROLE};
pub use work_order::{WorkOrder, WorkOrderStatus};

/// A record type living under a fixed key prefix.
pub trait Collection: Serialize + DeserializeOwned + Send + Sync {
    /// Key prefix including the separator, e.g. `"asset:"`.
    const PREFIX: &'static str;
    /// Human readable name used in errors.
    const NAME: &'static str;

    fn id(&self) -> &str;

    fn key_for(id: &str) -> String {
        format!("{}{}", Self::PREFIX, id)
    }

    fn key(&self) -> String {
        Self::key_for(self.id())
    }
}

/// Declares a string-backed enum with a fixed vocabulary. Unknown values
/// decode into `Other` and serialize back unchanged.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $variant:ident => $text:literal $(| $alias:literal)* ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $variant, )+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $text, )+
                    Self::Other(s) => s.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $text $(| $alias)* => Self::$variant, )+
                    _ => Self::Other(s),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                match v {
                    $name::Other(s) => s,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
pub(crate) use string_enum;

/// RFC 3339 rendering of `at`, as stored in `created_at` / `updated_at`.
pub fn timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            at.year(),
            at.month() as u8,
            at.day(),
            at.hour(),
            at.minute(),
            at.second()
        )
    })
}

/// Parse a stored timestamp. Accepts RFC 3339 and bare `YYYY-MM-DD` dates
/// (taken as midnight UTC); anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// Milliseconds since the Unix epoch, used in generated ids.
pub(crate) fn unix_millis(at: OffsetDateTime) -> i128 {
    at.unix_timestamp_nanos() / 1_000_000
}
