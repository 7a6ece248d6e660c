use anyhow::{Context, Result};
use reqwest::StatusCode;

use crate::api_types::{
    AnalyzeRequest, AnalyzeResponse, Encounter, parse_analyze_response_json,
    parse_encounters_json,
};
use crate::error::AnalysisError;
use crate::http_client::service_client;

pub fn fetch_encounters(base_url: &str) -> Result<Vec<Encounter>> {
    let client = service_client()?;
    let url = format!("{base_url}/api/encounters");
    let resp = client
        .get(&url)
        .send()
        .with_context(|| format!("request failed for {url}"))?
        .error_for_status()
        .with_context(|| format!("http error for {url}"))?;
    let body = resp.text().context("failed to read encounters body")?;
    parse_encounters_json(&body)
}

/// Run one analysis on the service.
///
/// Any failure, including a non-2xx status, comes back as `Transport` carrying
/// the response text, or the status reason when the body is blank.
pub fn post_analyze(
    base_url: &str,
    request: &AnalyzeRequest,
) -> Result<AnalyzeResponse, AnalysisError> {
    let client = service_client().map_err(|err| AnalysisError::Transport(err.to_string()))?;
    let url = format!("{base_url}/api/analyze");
    let resp = client
        .post(&url)
        .json(request)
        .send()
        .map_err(|err| AnalysisError::Transport(format!("request failed: {err}")))?;

    let status = resp.status();
    let body = resp
        .text()
        .map_err(|err| AnalysisError::Transport(format!("failed to read response: {err}")))?;

    if !status.is_success() {
        return Err(AnalysisError::Transport(failure_message(status, body)));
    }

    parse_analyze_response_json(&body).map_err(|err| AnalysisError::Transport(format!("{err:#}")))
}

/// The body exactly as sent, unless it is blank.
fn failure_message(status: StatusCode, body: String) -> String {
    if !body.trim().is_empty() {
        return body;
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_body_is_surfaced_unchanged() {
        let body = "  Report abc not found\n".to_string();
        assert_eq!(failure_message(StatusCode::NOT_FOUND, body.clone()), body);
    }

    #[test]
    fn blank_failure_body_falls_back_to_status_reason() {
        assert_eq!(
            failure_message(StatusCode::BAD_GATEWAY, " \n\t".to_string()),
            "Bad Gateway"
        );
        assert_eq!(
            failure_message(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            "Internal Server Error"
        );
    }

    #[test]
    fn unknown_status_without_reason_shows_the_code() {
        let status = StatusCode::from_u16(599).unwrap();
        assert_eq!(failure_message(status, String::new()), "599");
    }
}
