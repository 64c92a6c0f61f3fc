//! `date` namespace.

use serde_json::{Value, json};
use time::format_description::well_known::Rfc2822;
use time::{OffsetDateTime, UtcOffset};

use crate::clock;
use crate::error::RpcError;
use crate::extensions::{Extension, Params};

pub(super) fn extension() -> Extension {
    let zone = LocalZone::detect();
    Extension::builder("date")
        .version("1.0.0")
        .description("Reports the current date and time")
        .handler("now", move |_params: &Params| -> Result<Value, RpcError> {
            Ok(snapshot(OffsetDateTime::now_utc(), &zone))
        })
        .build()
}

/// Local offset and the name reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocalZone {
    offset: UtcOffset,
    name: String,
}

impl LocalZone {
    /// Resolves the local offset once, while the agent is still single
    /// threaded. When it cannot be determined the zone is UTC, and `$TZ` is
    /// not consulted.
    fn detect() -> Self {
        match UtcOffset::current_local_offset() {
            Ok(offset) => Self::named(offset, std::env::var("TZ").ok()),
            Err(_) => Self::named(UtcOffset::UTC, None),
        }
    }

    fn named(offset: UtcOffset, tz: Option<String>) -> Self {
        let name = tz
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| describe_offset(offset));
        Self { offset, name }
    }
}

fn snapshot(utc: OffsetDateTime, zone: &LocalZone) -> Value {
    let local = utc.to_offset(zone.offset);
    json!({
        "timestamp": clock::format_rfc3339(utc),
        "unix": utc.unix_timestamp(),
        "utc": utc.format(&Rfc2822).unwrap_or_default(),
        "local": clock::format_rfc3339(local),
        "timezone": zone.name,
    })
}

fn describe_offset(offset: UtcOffset) -> String {
    if offset.is_utc() {
        return "UTC".to_owned();
    }
    let (hours, minutes, _) = offset.as_hms();
    let sign = if offset.is_negative() { '-' } else { '+' };
    format!("UTC{sign}{:02}:{:02}", hours.unsigned_abs(), minutes.unsigned_abs())
}
