//! Parse a `getsourcecode` response body into an ArtifactBundle.

use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::fetch::ArtifactBundle;
use crate::retry::FetchError;

/// `{"status": "1", "message": "OK", "result": [...]}`
#[derive(Deserialize)]
struct Envelope<'a> {
    status: Value,
    #[serde(default)]
    message: String,
    #[serde(borrow)]
    result: &'a RawValue,
}

/// Parse a full response body.
///
/// `status != 1` is an API-level rejection: "rate limit" results are
/// throttling, anything else (bad key, invalid address) is a bad request.
pub fn parse_source_response(body: &[u8]) -> Result<ArtifactBundle, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FetchError::EmptyResponse);
    }
    let envelope: Envelope<'_> =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if !status_ok(&envelope.status) {
        let detail = match serde_json::from_str::<Value>(envelope.result.get()) {
            Ok(Value::String(s)) => s,
            Ok(other) => other.to_string(),
            Err(_) => envelope.result.get().to_string(),
        };
        if detail.to_ascii_lowercase().contains("rate limit")
            || envelope.message.to_ascii_lowercase().contains("rate limit")
        {
            return Err(FetchError::RateLimited(detail));
        }
        return Err(FetchError::BadRequest(format!(
            "{}: {}",
            envelope.message, detail
        )));
    }

    parse_result_payload(envelope.result.get())
}

/// Parse the `result` payload on its own (as stored in an artifact file).
pub fn parse_result_payload(raw: &str) -> Result<ArtifactBundle, FetchError> {
    let result: Value =
        serde_json::from_str(raw).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let entries = result
        .as_array()
        .ok_or_else(|| FetchError::Malformed("result is not an array".to_string()))?;
    let first = entries.first().ok_or(FetchError::EmptyResponse)?;

    let content = first
        .get("SourceCode")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::Malformed("result entry has no SourceCode".to_string()))?
        .to_string();
    let contract_name = first
        .get("ContractName")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ArtifactBundle {
        content,
        contract_name,
        raw_payload: raw.to_string(),
    })
}

fn status_ok(status: &Value) -> bool {
    match status {
        Value::String(s) => s == "1",
        Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    }
}
