//! Formatting and lenient parsing of the feed's ISO-8601 timestamps.

use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};

/// Format a timestamp the way stored and synthesized transactions carry it,
/// in UTC, e.g. "2025-04-05T19:00:41Z" or "2025-04-05T19:00:41.5Z".
///
/// Subseconds are only written when there are any.
pub fn format_timestamp(timestamp: OffsetDateTime) -> String {
    let utc = timestamp.to_offset(time::UtcOffset::UTC);

    let formatted = if utc.nanosecond() == 0 {
        utc.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
        ))
    } else {
        utc.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]Z"
        ))
    };

    formatted.unwrap_or_else(|_| utc.unix_timestamp().to_string())
}

/// Rewrite a feed timestamp in UTC so stored dates share one format.
///
/// Text that is not a readable timestamp is returned unchanged.
pub fn normalize_timestamp(text: &str) -> String {
    parse_timestamp(text).map_or_else(|| text.to_owned(), format_timestamp)
}

/// The current time formatted for response bodies.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

/// Parse an ISO-8601 timestamp from the feed.
///
/// Accepts RFC 3339 ("2025-04-05T19:00:41Z", "2025-04-05T19:00:41.123+00:00")
/// as well as a date-time without an offset ("2025-04-05T19:00:41"), which is
/// read as UTC. Returns `None` for anything else.
pub fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    if let Ok(timestamp) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(timestamp);
    }

    PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            text,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        )
    })
    .ok()
    .map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{format_timestamp, normalize_timestamp, parse_timestamp};

    #[test]
    fn parses_rfc3339_and_naive_timestamps() {
        let want = datetime!(2025-04-05 19:00:41 UTC);

        assert_eq!(parse_timestamp("2025-04-05T19:00:41Z"), Some(want));
        assert_eq!(parse_timestamp("2025-04-05T21:00:41+02:00"), Some(want));
        assert_eq!(parse_timestamp("2025-04-05T19:00:41"), Some(want));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn formats_in_utc_with_fixed_width() {
        let timestamp = datetime!(2025-04-05 21:00:41 +02:00);

        assert_eq!(format_timestamp(timestamp), "2025-04-05T19:00:41Z");
    }

    #[test]
    fn keeps_subseconds_when_present() {
        let timestamp = datetime!(2025-04-05 19:00:41.5 UTC);

        assert_eq!(format_timestamp(timestamp), "2025-04-05T19:00:41.5Z");
    }

    #[test]
    fn normalizes_offsets_to_utc() {
        assert_eq!(
            normalize_timestamp("2025-04-05T20:00:00-10:00"),
            "2025-04-06T06:00:00Z"
        );
        assert_eq!(
            normalize_timestamp("2025-04-05T19:00:41.500+00:00"),
            "2025-04-05T19:00:41.5Z"
        );
        assert_eq!(normalize_timestamp("last tuesday"), "last tuesday");
    }
}
