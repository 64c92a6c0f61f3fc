//! Wall-clock helpers shared by errors and the built-in extensions.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Current UTC time as an RFC 3339 string.
pub(crate) fn rfc3339_now() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}

/// Formats `moment` as RFC 3339, falling back to the Unix epoch for years
/// outside the representable range.
pub(crate) fn format_rfc3339(moment: OffsetDateTime) -> String {
    moment
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
