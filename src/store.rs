/// Measurement store access
///
/// All SQL for the service lives here. Callers pass validated descriptors
/// only; raw request strings never reach this module. Column names come
/// from the closed Field enum, so no user input is ever interpolated into
/// SQL text.

use postgres::Client;
use postgres::types::ToSql;

use crate::error::ApiError;
use crate::model::{Field, Measurement, MeasurementPoint};
use crate::validate::{DateRange, Pagination};

/// One page of a range query plus the total match count.
///
/// The page and the total come from two independent reads of the same
/// filter; under concurrent writes they can disagree momentarily. That
/// eventual inconsistency is accepted.
#[derive(Debug)]
pub struct RangePage {
    pub points: Vec<MeasurementPoint>,
    pub total: i64,
}

/// Single-pass aggregate summary of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregates {
    pub count: i64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

/// Build the WHERE clause for an optional timestamp window. Both bounds
/// are inclusive. Returns the clause text (empty when unbounded) and the
/// bound parameters in order.
fn range_filter<'a>(range: &'a DateRange) -> (String, Vec<&'a (dyn ToSql + Sync)>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

    if let Some(start) = range.start.as_ref() {
        params.push(start);
        clauses.push(format!("timestamp >= ${}", params.len()));
    }
    if let Some(end) = range.end.as_ref() {
        params.push(end);
        clauses.push(format!("timestamp <= ${}", params.len()));
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

/// SQL for one page of a range query: projects to timestamp plus the
/// one requested column, orders ascending, and parameterizes LIMIT and
/// OFFSET after the filter's bound parameters.
fn page_sql(field: Field, filter: &str, bound_params: usize) -> String {
    format!(
        "SELECT timestamp, {} FROM measurements{} \
         ORDER BY timestamp ASC LIMIT ${} OFFSET ${}",
        field.as_str(),
        filter,
        bound_params + 1,
        bound_params + 2,
    )
}

/// Fetch one page of a series over a timestamp window, ascending by
/// timestamp (ties keep store order), plus the total count of the full
/// matching set independent of paging. Projects to timestamp + the one
/// requested column.
pub fn query_range(
    client: &mut Client,
    field: Field,
    range: &DateRange,
    paging: &Pagination,
) -> Result<RangePage, ApiError> {
    let (filter, params) = range_filter(range);

    let sql = page_sql(field, &filter, params.len());

    let skip = paging.skip();
    let mut page_params = params.clone();
    page_params.push(&paging.limit);
    page_params.push(&skip);

    let rows = client.query(&sql, &page_params)?;
    let points = rows
        .iter()
        .map(|row| MeasurementPoint {
            timestamp: row.get(0),
            value: row.get(1),
        })
        .collect();

    let count_sql = format!("SELECT COUNT(*) FROM measurements{}", filter);
    let total: i64 = client.query_one(&count_sql, &params)?.get(0);

    Ok(RangePage { points, total })
}

/// Compute count/avg/min/max/population stddev of one series over an
/// optional timestamp window in a single aggregate query. Returns None
/// when the window matches no records.
pub fn aggregate(
    client: &mut Client,
    field: Field,
    range: &DateRange,
) -> Result<Option<Aggregates>, ApiError> {
    let (filter, params) = range_filter(range);
    let col = field.as_str();

    let sql = format!(
        "SELECT COUNT(*), AVG({0}), MIN({0}), MAX({0}), STDDEV_POP({0}) \
         FROM measurements{1}",
        col, filter,
    );

    let row = client.query_one(&sql, &params)?;
    let count: i64 = row.get(0);
    if count == 0 {
        return Ok(None);
    }

    // With count > 0 the aggregates are non-NULL; STDDEV_POP of a single
    // row is 0, not NULL, because it divides by N
    Ok(Some(Aggregates {
        count,
        avg: row.get::<_, Option<f64>>(1).unwrap_or(0.0),
        min: row.get::<_, Option<f64>>(2).unwrap_or(0.0),
        max: row.get::<_, Option<f64>>(3).unwrap_or(0.0),
        std_dev: row.get::<_, Option<f64>>(4).unwrap_or(0.0),
    }))
}

/// Persist one measurement. Exactly one insert, no read-modify-write, so
/// no transaction is needed.
pub fn insert_measurement(client: &mut Client, m: &Measurement) -> Result<(), ApiError> {
    client.execute(
        "INSERT INTO measurements (timestamp, field1, field2, field3) \
         VALUES ($1, $2, $3, $4)",
        &[&m.timestamp, &m.field1, &m.field2, &m.field3],
    )?;
    Ok(())
}
