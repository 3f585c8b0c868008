use std::time::Duration;

use crate::agent::Failure;
use ureq::{self, Agent};

/// POST a JSON body with extra headers and return the response body.
///
/// Non-2xx answers keep the service's body in the failure: 408, 429 and 5xx
/// become [`Failure::ServiceUnavailable`], any other status is
/// [`Failure::Rejected`]. Transport errors are `ServiceUnavailable`, and
/// running past `timeout` is [`Failure::Timeout`].
pub fn http_post_json(
    url: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
    timeout: Duration,
) -> Result<String, Failure> {
    let config = Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();

    let agent: Agent = config.into();

    let mut request = agent.post(url);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let mut response = request
        .send_json(body)
        .map_err(|e| transport_failure(e, timeout))?;
    let status = response.status().as_u16();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| transport_failure(e, timeout))?;

    if (200..300).contains(&status) {
        Ok(text)
    } else {
        Err(status_failure(status, text))
    }
}

fn transport_failure(e: ureq::Error, timeout: Duration) -> Failure {
    match e {
        ureq::Error::Timeout(_) => Failure::Timeout(timeout),
        other => Failure::from(other),
    }
}

fn status_failure(status: u16, body: String) -> Failure {
    let body = body.trim().to_string();
    match status {
        408 | 429 | 500..=599 => Failure::ServiceUnavailable(format!("http status {status}: {body}")),
        _ => Failure::Rejected { status, body },
    }
}
