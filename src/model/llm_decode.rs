use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::model::message::ChatThread;
use crate::model::narrative_event::{EventEnvelope, LifeEvent};

/// Why a workflow response could not be turned into a payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("workflow rejected the request (code {code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("workflow response has no `{0}` field")]
    MissingField(&'static str),
    #[error("workflow {stage} is not valid JSON: {source}")]
    InvalidJson {
        stage: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("workflow output has an unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Unwraps a workflow response down to its `output` payload.
///
/// Any level may arrive as a JSON-encoded string: the response itself,
/// its `data` field, and the `output` field inside `data`.
pub fn decode_workflow_output(response: Value) -> Result<Value, DecodeError> {
    let envelope = unwrap_json(response, "response")?;

    if let Some(code) = envelope.get("code").and_then(Value::as_i64) {
        if code != 0 {
            let message = envelope
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(DecodeError::Rejected { code, message });
        }
    }

    let data = if envelope.get("output").is_some() {
        envelope
    } else {
        let Value::Object(mut fields) = envelope else {
            return Err(DecodeError::MissingField("data"));
        };
        let data = fields.remove("data").ok_or(DecodeError::MissingField("data"))?;
        unwrap_json(data, "data")?
    };

    let Value::Object(mut data) = data else {
        return Err(DecodeError::MissingField("output"));
    };
    let output = data.remove("output").ok_or(DecodeError::MissingField("output"))?;
    unwrap_json(output, "output")
}

/// Talent strings from the talent workflow, e.g. `"明眸皓齿（颜值+3）"`.
pub fn decode_talents(response: Value) -> Result<Vec<String>, DecodeError> {
    decode_payload(response)
}

/// First event of the event workflow, if it produced any.
pub fn decode_event(response: Value) -> Result<Option<LifeEvent>, DecodeError> {
    let envelope: EventEnvelope = decode_payload(response)?;
    Ok(envelope.events.into_iter().next())
}

/// Conversations from the chat workflow.
pub fn decode_messages(response: Value) -> Result<Vec<ChatThread>, DecodeError> {
    let output = decode_workflow_output(response)?;
    let Some(messages) = output.get("messages") else {
        return Err(DecodeError::MissingField("messages"));
    };
    serde_json::from_value(messages.clone()).map_err(DecodeError::Shape)
}

fn decode_payload<T: DeserializeOwned>(response: Value) -> Result<T, DecodeError> {
    let output = decode_workflow_output(response)?;
    serde_json::from_value(output).map_err(DecodeError::Shape)
}

fn unwrap_json(value: Value, stage: &'static str) -> Result<Value, DecodeError> {
    match value {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|source| DecodeError::InvalidJson { stage, source }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_doubly_encoded_output() {
        let output = json!(["明眸皓齿（颜值+3）", "体弱（体质-2）"]).to_string();
        let data = json!({ "output": output }).to_string();
        let response = json!({ "code": 0, "msg": "", "data": data });

        let talents = decode_talents(response).unwrap();
        assert_eq!(talents, vec!["明眸皓齿（颜值+3）", "体弱（体质-2）"]);
    }

    #[test]
    fn accepts_plain_objects_at_every_level() {
        let response = json!({ "data": { "output": { "events": [
            { "briefDescription": "入学", "content": "14岁：上了初中" },
            { "content": "ignored" }
        ] } } });

        let event = decode_event(response).unwrap().unwrap();
        assert_eq!(event.brief_description, "入学");
        assert_eq!(event.content, "14岁：上了初中");
    }

    #[test]
    fn string_response_is_treated_as_data() {
        let response = Value::String(json!({ "output": { "events": [] } }).to_string());
        assert!(decode_event(response).unwrap().is_none());
    }

    #[test]
    fn non_zero_code_is_rejected() {
        let response = json!({ "code": 4100, "msg": "token expired", "data": "" });
        let err = decode_talents(response).unwrap_err();
        assert!(matches!(err, DecodeError::Rejected { code: 4100, .. }));
    }

    #[test]
    fn missing_output_is_reported() {
        let response = json!({ "code": 0, "data": { "result": [] } });
        let err = decode_talents(response).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField("output")));
    }

    #[test]
    fn broken_json_is_reported_with_stage() {
        let response = json!({ "code": 0, "data": "{not json" });
        let err = decode_talents(response).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson { stage: "data", .. }));
    }

    #[test]
    fn messages_require_the_messages_key() {
        let response = json!({ "data": { "output": { "chats": [] } } });
        assert!(matches!(
            decode_messages(response).unwrap_err(),
            DecodeError::MissingField("messages")
        ));

        let response = json!({ "data": { "output": { "messages": [
            { "fromCharacter": "妈妈", "messageChain": [{ "text": "回家吃饭" }] }
        ] } } });
        let threads = decode_messages(response).unwrap();
        assert_eq!(threads[0].from_character, "妈妈");
    }
}
