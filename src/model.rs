/// Shared data types for the measurement API
///
/// A Measurement is one timestamped sample carrying three independent
/// numeric series (field1, field2, field3) on a common timestamp axis.
/// The store-assigned row id is internal and never serialized.

use chrono::{DateTime, SecondsFormat, Utc};

/// The three queryable series. Query parameters arrive as strings but are
/// mapped to this closed set before any storage access, so column names
/// are always compile-time constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Field1,
    Field2,
    Field3,
}

/// Allow-set as quoted in validation error messages.
pub const ALLOWED_FIELDS: &str = "field1, field2, field3";

impl Field {
    /// Parse an external field name. Anything outside the allow-set is None.
    pub fn parse(name: &str) -> Option<Field> {
        match name {
            "field1" => Some(Field::Field1),
            "field2" => Some(Field::Field2),
            "field3" => Some(Field::Field3),
            _ => None,
        }
    }

    /// External name, which is also the column name in the measurements table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Field1 => "field1",
            Field::Field2 => "field2",
            Field::Field3 => "field3",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One full measurement record as ingested and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub field1: f64,
    pub field2: f64,
    pub field3: f64,
}

impl Measurement {
    /// Value of the requested series.
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::Field1 => self.field1,
            Field::Field2 => self.field2,
            Field::Field3 => self.field3,
        }
    }
}

/// One row of a projected range query: the timestamp plus the single
/// requested series value.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Wire format for timestamps: RFC 3339 UTC with millisecond precision,
/// e.g. "2026-01-26T10:00:00.000Z".
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_field_parse_allow_set() {
        assert_eq!(Field::parse("field1"), Some(Field::Field1));
        assert_eq!(Field::parse("field2"), Some(Field::Field2));
        assert_eq!(Field::parse("field3"), Some(Field::Field3));
        assert_eq!(Field::parse("field4"), None);
        assert_eq!(Field::parse("FIELD1"), None);
        assert_eq!(Field::parse(""), None);
    }

    #[test]
    fn test_field_name_round_trip() {
        for field in [Field::Field1, Field::Field2, Field::Field3] {
            assert_eq!(Field::parse(field.as_str()), Some(field));
        }
    }

    #[test]
    fn test_measurement_value_selects_series() {
        let m = Measurement {
            timestamp: Utc::now(),
            field1: 1.5,
            field2: 2.5,
            field3: 3.5,
        };
        assert_eq!(m.value(Field::Field1), 1.5);
        assert_eq!(m.value(Field::Field2), 2.5);
        assert_eq!(m.value(Field::Field3), 3.5);
    }

    #[test]
    fn test_timestamp_wire_format() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 26, 10, 0, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2026-01-26T10:00:00.000Z");
    }
}
