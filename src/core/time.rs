use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime, PrimitiveDateTime};
use time::macros::format_description;

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Stored timestamps are UTC without an offset; they leave the API as RFC 3339 with `Z`.
pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_date(value: Date) -> String {
    value.format(&format_description!("[year]-[month]-[day]")).unwrap_or_else(|_| value.to_string())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, which is truncated to its UTC date.
pub(crate) fn parse_date_flexible(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Some(value);
    }

    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .map(|value| value.to_offset(time::UtcOffset::UTC).date())
}
