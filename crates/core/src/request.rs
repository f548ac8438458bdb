//! Validation of the raw `/ai/generate` request body.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    types::{CompletionRequest, DEFAULT_TEMPERATURE},
};

impl CompletionRequest {
    /// Parse and validate a JSON request body.
    ///
    /// Fields are checked in order `videoId`, `prompt`, `temperature`, and the
    /// first offending field is reported. Unknown fields are ignored.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::validation("body", format!("invalid JSON: {e}")))?;
        let Value::Object(fields) = value else {
            return Err(Error::validation("body", "expected a JSON object"));
        };

        Ok(Self {
            video_id: parse_video_id(&fields)?,
            prompt: parse_prompt(&fields)?,
            temperature: parse_temperature(&fields)?,
        })
    }
}

fn parse_video_id(fields: &Map<String, Value>) -> Result<Uuid> {
    let raw = match fields.get("videoId") {
        Some(Value::String(s)) => s,
        Some(_) => return Err(Error::validation("videoId", "expected a string")),
        None => return Err(Error::validation("videoId", "required")),
    };

    // Only the canonical hyphenated form is accepted.
    if raw.len() != 36 {
        return Err(Error::validation("videoId", "invalid uuid"));
    }
    Uuid::try_parse(raw).map_err(|_| Error::validation("videoId", "invalid uuid"))
}

fn parse_prompt(fields: &Map<String, Value>) -> Result<String> {
    match fields.get("prompt") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::validation("prompt", "expected a string")),
        None => Err(Error::validation("prompt", "required")),
    }
}

fn parse_temperature(fields: &Map<String, Value>) -> Result<f32> {
    let number = match fields.get("temperature") {
        None => return Ok(DEFAULT_TEMPERATURE),
        Some(Value::Number(n)) => n.as_f64(),
        Some(_) => return Err(Error::validation("temperature", "expected a number")),
    };

    match number {
        Some(t) if t.is_finite() && (0.0..=1.0).contains(&t) => Ok(t as f32),
        _ => Err(Error::validation(
            "temperature",
            "must be between 0 and 1 inclusive",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

    fn field_of(err: Error) -> &'static str {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn should_parse_valid_request() {
        // given
        let body = format!(r#"{{"videoId":"{VIDEO_ID}","prompt":"Sum up {{transcription}}","temperature":0.2}}"#);

        // when
        let request = CompletionRequest::from_body(body.as_bytes()).unwrap();

        // then
        assert_eq!(request.video_id, Uuid::parse_str(VIDEO_ID).unwrap());
        assert_eq!(request.prompt, "Sum up {transcription}");
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn should_default_temperature_when_absent() {
        let body = format!(r#"{{"videoId":"{VIDEO_ID}","prompt":"hi"}}"#);

        let request = CompletionRequest::from_body(body.as_bytes()).unwrap();

        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn should_accept_empty_prompt() {
        let body = format!(r#"{{"videoId":"{VIDEO_ID}","prompt":""}}"#);

        let request = CompletionRequest::from_body(body.as_bytes()).unwrap();

        assert_eq!(request.prompt, "");
    }

    #[test]
    fn should_accept_temperature_bounds() {
        for t in ["0", "1", "0.0", "1.0"] {
            let body = format!(r#"{{"videoId":"{VIDEO_ID}","prompt":"p","temperature":{t}}}"#);
            assert!(CompletionRequest::from_body(body.as_bytes()).is_ok(), "{t}");
        }
    }

    #[test]
    fn should_reject_temperature_out_of_range() {
        for t in ["-0.01", "1.01", "2", "1e3"] {
            let body = format!(r#"{{"videoId":"{VIDEO_ID}","prompt":"p","temperature":{t}}}"#);
            let err = CompletionRequest::from_body(body.as_bytes()).unwrap_err();
            assert_eq!(field_of(err), "temperature", "{t}");
        }
    }

    #[test]
    fn should_reject_non_numeric_temperature() {
        for t in ["null", r#""0.5""#, "true"] {
            let body = format!(r#"{{"videoId":"{VIDEO_ID}","prompt":"p","temperature":{t}}}"#);
            let err = CompletionRequest::from_body(body.as_bytes()).unwrap_err();
            assert_eq!(field_of(err), "temperature", "{t}");
        }
    }

    #[test]
    fn should_reject_malformed_video_id() {
        for id in [
            "not-a-uuid",
            "123e4567e89b12d3a456426614174000",
            "{123e4567-e89b-12d3-a456-426614174000}",
            "123e4567-e89b-12d3-a456-42661417400g",
        ] {
            let body = format!(r#"{{"videoId":"{id}","prompt":"p"}}"#);
            let err = CompletionRequest::from_body(body.as_bytes()).unwrap_err();
            assert_eq!(field_of(err), "videoId", "{id}");
        }
    }

    #[test]
    fn should_reject_missing_fields() {
        let err = CompletionRequest::from_body(br#"{"prompt":"p"}"#).unwrap_err();
        assert_eq!(field_of(err), "videoId");

        let body = format!(r#"{{"videoId":"{VIDEO_ID}"}}"#);
        let err = CompletionRequest::from_body(body.as_bytes()).unwrap_err();
        assert_eq!(field_of(err), "prompt");
    }

    #[test]
    fn should_reject_non_object_body() {
        for body in ["", "[]", "\"text\"", "{"] {
            let err = CompletionRequest::from_body(body.as_bytes()).unwrap_err();
            assert_eq!(field_of(err), "body", "{body}");
        }
    }

    #[test]
    fn should_name_field_in_message() {
        let err = CompletionRequest::from_body(br#"{"videoId":42,"prompt":"p"}"#).unwrap_err();

        assert_eq!(err.to_string(), "videoId: expected a string");
    }
}
