//! Blocking transport helpers
//!
//! Every request carries the `AuthenticationTicket` header once logged in;
//! bodies are JSON. Status mapping: 401 is an authentication failure, any
//! other non-2xx status is returned with its body as the message.

use ica_core::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Header carrying the session ticket, on the login response and on every
/// authenticated request
pub const AUTH_TICKET_HEADER: &str = "AuthenticationTicket";

/// Optional correlation header for mutations
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Join an endpoint onto the base URL
pub fn rest_url(base_url: &str, endpoint: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
}

fn with_headers(
    request: RequestBuilder,
    ticket: Option<&str>,
    request_id: Option<&str>,
) -> RequestBuilder {
    let request = match ticket {
        Some(ticket) => request.header(AUTH_TICKET_HEADER, ticket),
        None => request,
    };
    match request_id {
        Some(id) => request.header(REQUEST_ID_HEADER, id),
        None => request,
    }
}

fn send(request: RequestBuilder, url: &str) -> Result<Response> {
    let response = request
        .send()
        .map_err(|e| Error::http(format!("Request to {} failed: {}", url, e)))?;
    check_status(response)
}

/// Map a non-2xx response to an error
pub(crate) fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response
        .text()
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(Error::auth(format!("HTTP 401 from {}", url))),
        _ => {
            tracing::debug!("HTTP {} from {}: {}", status.as_u16(), url, body);
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown status").to_string()
            } else {
                body
            };
            Err(Error::http_status(status.as_u16(), message))
        }
    }
}

fn read_json(response: Response, url: &str) -> Result<Value> {
    let body = response
        .text()
        .map_err(|e| Error::http(format!("Failed to read response from {}: {}", url, e)))?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// GET and decode a JSON body
pub fn get<T: DeserializeOwned>(session: &Client, url: &str, ticket: Option<&str>) -> Result<T> {
    tracing::debug!("GET {}", url);
    let response = send(with_headers(session.get(url), ticket, None), url)?;
    let value = read_json(response, url)?;
    Ok(serde_json::from_value(value)?)
}

/// POST a JSON body
///
/// # Returns
///
/// The decoded response body, or `Value::Null` when the body is empty
pub fn post<B: Serialize + ?Sized>(
    session: &Client,
    url: &str,
    ticket: Option<&str>,
    body: &B,
    request_id: Option<&str>,
) -> Result<Value> {
    tracing::debug!("POST {}", url);
    let body = serde_json::to_vec(body)?;
    let request = with_headers(session.post(url), ticket, request_id)
        .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(body);
    let response = send(request, url)?;
    read_json(response, url)
}

/// DELETE a resource
///
/// Non-2xx statuses are errors, so `Ok` always carries `true`.
pub fn delete(
    session: &Client,
    url: &str,
    ticket: Option<&str>,
    request_id: Option<&str>,
) -> Result<bool> {
    tracing::debug!("DELETE {}", url);
    let response = send(with_headers(session.delete(url), ticket, request_id), url)?;
    Ok(response.status().is_success())
}
