/// HTTP endpoint for the measurement API
///
/// Routes (relative to the listen port):
/// - GET  /api/measurements         - Paginated range query over one series
/// - GET  /api/measurements/metrics - Aggregate statistics over one series
/// - POST /api/measurements         - Ingest a single measurement
/// - GET  /health                   - Service health check
///
/// Every response body is JSON; failures share the uniform shape
/// `{error: <kind>, message: <text>}`. All request validation happens
/// before any database access.

use std::sync::Arc;

use chrono::Utc;
use postgres::Client;
use serde_json::{Value, json};
use tiny_http::Method;

use crate::db;
use crate::error::ApiError;
use crate::model::{Field, Measurement, format_timestamp};
use crate::store;
use crate::validate;

// ---------------------------------------------------------------------------
// Query-string parsing
// ---------------------------------------------------------------------------

/// Decode the raw query string into name/value pairs. Percent-encoding
/// and `+` for space are both handled; pairs that fail to decode are kept
/// verbatim so validation can still reject them with a useful message.
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, value) = part.split_once('=').unwrap_or((part, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => plus_decoded,
    }
}

/// First occurrence of a parameter, with empty values treated as absent
/// (`?start_date=` carries no bound).
fn query_param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Request descriptors (validation, no storage access)
// ---------------------------------------------------------------------------

/// Fully validated range query, with the raw date strings kept for
/// echoing back in the response meta block.
#[derive(Debug)]
struct RangeRequest {
    field: Field,
    start_date: String,
    end_date: String,
    range: validate::DateRange,
    paging: validate::Pagination,
}

fn parse_range_request(pairs: &[(String, String)]) -> Result<RangeRequest, ApiError> {
    let field = validate::parse_field(query_param(pairs, "field"))?;

    let start_date = query_param(pairs, "start_date");
    let end_date = query_param(pairs, "end_date");
    let (Some(start_date), Some(end_date)) = (start_date, end_date) else {
        return Err(ApiError::Validation(
            "start_date and end_date are required (YYYY-MM-DD).".to_string(),
        ));
    };

    let range = validate::parse_date_range(Some(start_date), Some(end_date))?;
    let paging = validate::parse_pagination(query_param(pairs, "page"), query_param(pairs, "limit"))?;

    Ok(RangeRequest {
        field,
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        range,
        paging,
    })
}

/// Validated aggregation query; both date bounds optional.
#[derive(Debug)]
struct MetricsRequest {
    field: Field,
    start_date: Option<String>,
    end_date: Option<String>,
    range: validate::DateRange,
}

fn parse_metrics_request(pairs: &[(String, String)]) -> Result<MetricsRequest, ApiError> {
    let field = validate::parse_field(query_param(pairs, "field"))?;

    let start_date = query_param(pairs, "start_date");
    let end_date = query_param(pairs, "end_date");
    let range = validate::parse_date_range(start_date, end_date)?;

    Ok(MetricsRequest {
        field,
        start_date: start_date.map(str::to_string),
        end_date: end_date.map(str::to_string),
        range,
    })
}

/// Validate a POST body into a measurement. Each series value must be a
/// finite JSON number; a missing timestamp defaults to now.
fn parse_ingest_body(raw: &str) -> Result<Measurement, ApiError> {
    let body: Value = serde_json::from_str(raw)
        .map_err(|_| ApiError::Validation("Invalid JSON body.".to_string()))?;

    let mut values = [0.0f64; 3];
    for (slot, name) in values.iter_mut().zip(["field1", "field2", "field3"]) {
        *slot = body
            .get(name)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .ok_or_else(|| ApiError::Validation(format!("{} must be a valid number.", name)))?;
    }

    let timestamp = match body.get("timestamp") {
        None | Some(Value::Null) => Utc::now(),
        Some(Value::String(s)) if s.is_empty() => Utc::now(),
        Some(Value::String(s)) => validate::parse_timestamp(s)?,
        Some(_) => {
            return Err(ApiError::Validation(
                "timestamp must be an ISO string.".to_string(),
            ));
        }
    };

    Ok(Measurement {
        timestamp,
        field1: values[0],
        field2: values[1],
        field3: values[2],
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Round a statistic to 3 decimal places, ties away from zero.
fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn handle_range_query(
    client: &mut Client,
    pairs: &[(String, String)],
) -> Result<(u16, Value), ApiError> {
    let req = parse_range_request(pairs)?;

    let page = store::query_range(client, req.field, &req.range, &req.paging)?;
    if page.points.is_empty() {
        return Err(ApiError::NoData(
            "No measurements found for the specified range.".to_string(),
        ));
    }

    let data: Vec<Value> = page
        .points
        .iter()
        .map(|p| {
            json!({
                "timestamp": format_timestamp(p.timestamp),
                (req.field.as_str()): p.value,
            })
        })
        .collect();

    Ok((
        200,
        json!({
            "meta": {
                "field": req.field.as_str(),
                "start_date": req.start_date,
                "end_date": req.end_date,
                "page": req.paging.page,
                "limit": req.paging.limit,
                "total": page.total,
                "returned": data.len(),
            },
            "data": data,
        }),
    ))
}

fn handle_metrics(
    client: &mut Client,
    pairs: &[(String, String)],
) -> Result<(u16, Value), ApiError> {
    let req = parse_metrics_request(pairs)?;

    let agg = store::aggregate(client, req.field, &req.range)?.ok_or_else(|| {
        ApiError::NoData("No measurements found for the specified filters.".to_string())
    })?;

    // Echo only the bounds the caller supplied; null means unfiltered
    let range_echo = if req.start_date.is_none() && req.end_date.is_none() {
        Value::Null
    } else {
        json!({
            "start_date": req.start_date,
            "end_date": req.end_date,
        })
    };

    Ok((
        200,
        json!({
            "field": req.field.as_str(),
            "range": range_echo,
            "count": agg.count,
            "avg": round3(agg.avg),
            "min": round3(agg.min),
            "max": round3(agg.max),
            "stdDev": round3(agg.std_dev),
        }),
    ))
}

fn handle_ingest(client: &mut Client, body: &str) -> Result<(u16, Value), ApiError> {
    let measurement = parse_ingest_body(body)?;

    store::insert_measurement(client, &measurement)?;

    Ok((
        201,
        json!({
            "message": "Measurement created",
            "data": {
                "timestamp": format_timestamp(measurement.timestamp),
                "field1": measurement.field1,
                "field2": measurement.field2,
                "field3": measurement.field3,
            },
        }),
    ))
}

fn handle_health() -> (u16, Value) {
    (
        200,
        json!({
            "status": "ok",
            "service": "measurement_service",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn not_found() -> (u16, Value) {
    (
        404,
        json!({
            "error": "NotFound",
            "message": "API route not found",
        }),
    )
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

fn dispatch(
    client: &mut Client,
    method: &Method,
    path: &str,
    pairs: &[(String, String)],
    body: &str,
) -> Result<(u16, Value), ApiError> {
    match (method, path) {
        (Method::Get, "/health") => Ok(handle_health()),
        (Method::Get, "/api/measurements") | (Method::Get, "/api/measurements/") => {
            handle_range_query(client, pairs)
        }
        (Method::Get, "/api/measurements/metrics") => handle_metrics(client, pairs),
        (Method::Post, "/api/measurements") | (Method::Post, "/api/measurements/") => {
            handle_ingest(client, body)
        }
        _ => Ok(not_found()),
    }
}

/// Convert a failure into the uniform error body. Server errors are
/// logged in full here; the client only sees a generic message. NoData is
/// a normal outcome and is not logged.
fn error_response(err: &ApiError) -> (u16, Value) {
    if let ApiError::Server(detail) = err {
        eprintln!("✗ Request failed: {}", detail);
    }

    (
        err.status_code(),
        json!({
            "error": err.kind(),
            "message": err.client_message(),
        }),
    )
}

fn handle_request(client: &mut Client, mut request: tiny_http::Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let pairs = parse_query(query);

    let mut body = String::new();
    let outcome = if method == Method::Post && request.as_reader().read_to_string(&mut body).is_err()
    {
        Err(ApiError::Validation("Invalid JSON body.".to_string()))
    } else {
        dispatch(client, &method, path, &pairs, &body)
    };

    let (status, payload) = match outcome {
        Ok(success) => success,
        Err(err) => error_response(&err),
    };

    if let Err(e) = request.respond(create_response(status, payload)) {
        eprintln!("Failed to send response: {}", e);
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start the API server on the specified port with a fixed pool of
/// request workers. Each worker owns its own database connection; the
/// tiny_http server hands requests to whichever worker is free.
///
/// Blocks for the lifetime of the service.
pub fn start_endpoint_server(port: u16, workers: usize) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;
    let server = Arc::new(server);

    println!("📡 HTTP endpoint listening on http://0.0.0.0:{}", port);
    println!("   GET  /api/measurements         - Paginated range query");
    println!("   GET  /api/measurements/metrics - Aggregate statistics");
    println!("   POST /api/measurements         - Ingest one measurement");
    println!("   GET  /health                   - Service health check\n");

    let mut handles = Vec::new();
    for _ in 0..workers {
        let server = Arc::clone(&server);
        let mut client = db::connect_with_validation().map_err(|e| e.to_string())?;

        handles.push(std::thread::spawn(move || {
            for request in server.incoming_requests() {
                handle_request(&mut client, request);
            }
        }));
    }

    for handle in handles {
        if handle.join().is_err() {
            return Err("Request worker panicked".to_string());
        }
    }

    Ok(())
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = json.to_string();
    let bytes = body.into_bytes();

    tiny_http::Response::from_data(bytes)
        .with_status_code(tiny_http::StatusCode::from(status_code))
        .with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
