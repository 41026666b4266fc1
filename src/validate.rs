/// Request validation layer
///
/// Turns raw string-typed query parameters into typed query descriptors
/// before any storage access. Every rejection is an ApiError::Validation
/// with a message the client can act on. Nothing in this module touches
/// the database.
///
/// Date-range semantics: `start_date` means 00:00:00.000 UTC of that
/// calendar day (inclusive), `end_date` means 23:59:59.999 UTC of that
/// day (inclusive), so `start_date == end_date` selects exactly one UTC
/// day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::ApiError;
use crate::model::{ALLOWED_FIELDS, Field};

/// Pagination defaults and cap. The cap bounds worst-case payload size
/// and store scan cost per request.
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 500;
pub const MAX_LIMIT: i64 = 5000;

/// Validated timestamp window. An absent bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Unbounded range: no time filter at all.
    pub fn unbounded() -> Self {
        DateRange { start: None, end: None }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Validated pagination descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Row offset into the full matching set. Saturates instead of
    /// overflowing: an offset past the data yields an empty page, which
    /// the endpoint maps to NoData.
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// Validate the `field` query parameter against the closed allow-set.
pub fn parse_field(raw: Option<&str>) -> Result<Field, ApiError> {
    let name = raw.ok_or_else(|| {
        ApiError::Validation("Missing field query param.".to_string())
    })?;

    Field::parse(name).ok_or_else(|| {
        ApiError::Validation(format!("Invalid field. Allowed: {}", ALLOWED_FIELDS))
    })
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Literal YYYY-MM-DD shape: exact widths, hyphen-separated, nothing else.
fn is_iso_date_only(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse one date bound. Shape errors and calendar errors get distinct
/// messages so the client knows whether the format or the value is wrong.
fn parse_date_only(label: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    if !is_iso_date_only(raw) {
        return Err(ApiError::Validation(format!(
            "Invalid {}. Expected YYYY-MM-DD.",
            label
        )));
    }

    // Shape is already verified, so the slices are pure digits
    let year: i32 = raw[0..4].parse().map_err(|_| invalid_value(label))?;
    let month: u32 = raw[5..7].parse().map_err(|_| invalid_value(label))?;
    let day: u32 = raw[8..10].parse().map_err(|_| invalid_value(label))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid_value(label))
}

fn invalid_value(label: &str) -> ApiError {
    ApiError::Validation(format!("Invalid {} value.", label))
}

/// Validate an optional pair of date bounds into a timestamp window.
///
/// Empty strings are treated as absent, matching query-string semantics
/// where `?start_date=` carries no bound.
pub fn parse_date_range(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<DateRange, ApiError> {
    let start = match start_date.filter(|s| !s.is_empty()) {
        Some(raw) => {
            let day = parse_date_only("start_date", raw)?;
            let start = day
                .and_hms_milli_opt(0, 0, 0, 0)
                .ok_or_else(|| invalid_value("start_date"))?;
            Some(Utc.from_utc_datetime(&start))
        }
        None => None,
    };

    let end = match end_date.filter(|s| !s.is_empty()) {
        Some(raw) => {
            let day = parse_date_only("end_date", raw)?;
            let end = day
                .and_hms_milli_opt(23, 59, 59, 999)
                .ok_or_else(|| invalid_value("end_date"))?;
            Some(Utc.from_utc_datetime(&end))
        }
        None => None,
    };

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(ApiError::Validation(
                "start_date must be <= end_date.".to_string(),
            ));
        }
    }

    Ok(DateRange { start, end })
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Validate `page` and `limit`, applying defaults for absent parameters.
/// Parsing is total: anything that is not a plain integer fails.
pub fn parse_pagination(
    page_raw: Option<&str>,
    limit_raw: Option<&str>,
) -> Result<Pagination, ApiError> {
    let page = match page_raw.filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            ApiError::Validation("Invalid page. Expected integer >= 1.".to_string())
        })?,
        None => DEFAULT_PAGE,
    };
    if page < 1 {
        return Err(ApiError::Validation(
            "Invalid page. Expected integer >= 1.".to_string(),
        ));
    }

    let limit = match limit_raw.filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            ApiError::Validation("Invalid limit. Expected integer 1..5000.".to_string())
        })?,
        None => DEFAULT_LIMIT,
    };
    if limit < 1 || limit > MAX_LIMIT {
        return Err(ApiError::Validation(
            "Invalid limit. Expected integer 1..5000.".to_string(),
        ));
    }

    Ok(Pagination { page, limit })
}

// ---------------------------------------------------------------------------
// Ingestion timestamp
// ---------------------------------------------------------------------------

/// Parse an ingestion timestamp string into a UTC instant.
///
/// Accepts RFC 3339 with an offset or `Z`, a naive ISO datetime
/// (interpreted as UTC), or a bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(ApiError::Validation(
        "Invalid timestamp. Use ISO format like 2026-01-26T10:00:00Z".to_string(),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_message(err: ApiError) -> String {
        match err {
            ApiError::Validation(msg) => msg,
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_field_allow_set() {
        assert_eq!(parse_field(Some("field2")).unwrap(), Field::Field2);

        let msg = validation_message(parse_field(Some("field4")).unwrap_err());
        assert_eq!(msg, "Invalid field. Allowed: field1, field2, field3");

        let msg = validation_message(parse_field(None).unwrap_err());
        assert_eq!(msg, "Missing field query param.");
    }

    #[test]
    fn test_date_shape_rejections() {
        // All shape violations, none reach calendar validation
        for bad in ["2026-1-02", "2026/01/02", "20260102", "2026-01-02T00:00:00", "jan 2"] {
            let err = parse_date_range(Some(bad), None).unwrap_err();
            assert_eq!(
                validation_message(err),
                "Invalid start_date. Expected YYYY-MM-DD.",
                "should reject shape: {}",
                bad
            );
        }
    }

    #[test]
    fn test_date_calendar_rejections() {
        // Correct shape, impossible calendar values
        for bad in ["2026-13-40", "2026-00-10", "2026-02-30", "2025-02-29"] {
            let err = parse_date_range(None, Some(bad)).unwrap_err();
            assert_eq!(
                validation_message(err),
                "Invalid end_date value.",
                "should reject value: {}",
                bad
            );
        }
        // Leap day on an actual leap year is fine
        assert!(parse_date_range(Some("2024-02-29"), None).is_ok());
    }

    #[test]
    fn test_range_day_boundaries() {
        let range = parse_date_range(Some("2026-01-26"), Some("2026-01-26")).unwrap();
        let start = range.start.unwrap();
        let end = range.end.unwrap();

        assert_eq!(start.to_rfc3339(), "2026-01-26T00:00:00+00:00");
        assert_eq!(
            end.timestamp_millis() - start.timestamp_millis(),
            24 * 3600 * 1000 - 1,
            "single-day range must span exactly [00:00:00.000, 23:59:59.999]"
        );
    }

    #[test]
    fn test_range_ordering() {
        let err = parse_date_range(Some("2026-02-01"), Some("2026-01-01")).unwrap_err();
        assert_eq!(validation_message(err), "start_date must be <= end_date.");

        // Equal days are valid
        assert!(parse_date_range(Some("2026-01-01"), Some("2026-01-01")).is_ok());
    }

    #[test]
    fn test_range_optional_bounds() {
        assert!(parse_date_range(None, None).unwrap().is_unbounded());

        // Empty strings carry no bound
        assert!(parse_date_range(Some(""), Some("")).unwrap().is_unbounded());

        let open_end = parse_date_range(Some("2026-01-01"), None).unwrap();
        assert!(open_end.start.is_some());
        assert!(open_end.end.is_none());
    }

    #[test]
    fn test_pagination_defaults() {
        let p = parse_pagination(None, None).unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 500);
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn test_pagination_skip_offset() {
        let p = parse_pagination(Some("3"), Some("100")).unwrap();
        assert_eq!(p.skip(), 200);
    }

    #[test]
    fn test_pagination_huge_page_saturates_skip() {
        // i64::MAX is a valid page number; the offset must not overflow,
        // it just lands past all data and becomes an empty page
        let p = parse_pagination(Some("9223372036854775807"), Some("500")).unwrap();
        assert_eq!(p.page, i64::MAX);
        assert_eq!(p.skip(), i64::MAX);
        assert!(p.skip() > 0);
    }

    #[test]
    fn test_pagination_bounds() {
        // Inclusive cap
        assert!(parse_pagination(None, Some("5000")).is_ok());
        assert!(parse_pagination(None, Some("1")).is_ok());

        let err = parse_pagination(None, Some("5001")).unwrap_err();
        assert_eq!(
            validation_message(err),
            "Invalid limit. Expected integer 1..5000."
        );

        let err = parse_pagination(Some("0"), None).unwrap_err();
        assert_eq!(
            validation_message(err),
            "Invalid page. Expected integer >= 1."
        );

        assert!(parse_pagination(Some("-1"), None).is_err());
        assert!(parse_pagination(None, Some("0")).is_err());
    }

    #[test]
    fn test_pagination_rejects_non_integers() {
        for bad in ["1.5", "abc", "1e2", "10 "] {
            assert!(
                parse_pagination(Some(bad), None).is_err(),
                "page {} should fail",
                bad
            );
            assert!(
                parse_pagination(None, Some(bad)).is_err(),
                "limit {} should fail",
                bad
            );
        }
    }

    #[test]
    fn test_timestamp_formats() {
        let utc = parse_timestamp("2026-01-26T10:00:00Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-01-26T10:00:00+00:00");

        // Offset is normalized to UTC
        let offset = parse_timestamp("2026-01-26T10:00:00+02:00").unwrap();
        assert_eq!(offset.to_rfc3339(), "2026-01-26T08:00:00+00:00");

        // Naive datetime is taken as UTC
        let naive = parse_timestamp("2026-01-26T10:00:00").unwrap();
        assert_eq!(naive, utc);

        // Bare date is midnight UTC
        let date = parse_timestamp("2026-01-26").unwrap();
        assert_eq!(date.to_rfc3339(), "2026-01-26T00:00:00+00:00");
    }

    #[test]
    fn test_timestamp_rejections() {
        for bad in ["yesterday", "26/01/2026", "2026-01-26T99:00:00Z", ""] {
            let err = parse_timestamp(bad).unwrap_err();
            assert_eq!(
                validation_message(err),
                "Invalid timestamp. Use ISO format like 2026-01-26T10:00:00Z"
            );
        }
    }
}
