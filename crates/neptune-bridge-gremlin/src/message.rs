//! Gremlin Server wire messages (GraphSON 3).
//!
//! Requests go out as binary frames: one length byte, the mime type, then the
//! JSON request body. Responses arrive as JSON, one frame per batch.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use neptune_bridge_core::Bindings;

use crate::client::GremlinError;

pub const MIME_TYPE: &str = "application/vnd.gremlin-v3.0+json";
pub const LANGUAGE: &str = "gremlin-groovy";

/// Status codes used by Gremlin Server in response frames.
pub mod status {
    pub const SUCCESS: u16 = 200;
    pub const NO_CONTENT: u16 = 204;
    pub const PARTIAL_CONTENT: u16 = 206;
}

/// Encode an `eval` request as a mime-prefixed binary frame.
pub fn encode_request(
    request_id: Uuid,
    query: &str,
    bindings: Option<&Bindings>,
) -> Result<Vec<u8>, GremlinError> {
    let mut args = Map::new();
    args.insert("gremlin".to_string(), Value::String(query.to_string()));
    args.insert("language".to_string(), Value::String(LANGUAGE.to_string()));
    if let Some(bindings) = bindings {
        let typed: Map<String, Value> = bindings
            .iter()
            .map(|(name, value)| (name.clone(), to_graphson(value)))
            .collect();
        args.insert("bindings".to_string(), Value::Object(typed));
    }

    let body = json!({
        "requestId": { "@type": "g:UUID", "@value": request_id.to_string() },
        "op": "eval",
        "processor": "",
        "args": args,
    });
    let body = serde_json::to_vec(&body)?;

    let mut frame = Vec::with_capacity(1 + MIME_TYPE.len() + body.len());
    frame.push(MIME_TYPE.len() as u8);
    frame.extend_from_slice(MIME_TYPE.as_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Convert an untyped JSON value into its GraphSON 3 typed form.
pub fn to_graphson(value: &Value) -> Value {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => value.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "@type": "g:Int64", "@value": i })
            } else if let Some(u) = n.as_u64() {
                json!({ "@type": "g:BigInteger", "@value": u })
            } else {
                json!({ "@type": "g:Double", "@value": n.as_f64().unwrap_or_default() })
            }
        }
        Value::Array(items) => json!({
            "@type": "g:List",
            "@value": items.iter().map(to_graphson).collect::<Vec<_>>(),
        }),
        Value::Object(entries) => {
            let mut flat = Vec::with_capacity(entries.len() * 2);
            for (key, value) in entries {
                flat.push(Value::String(key.clone()));
                flat.push(to_graphson(value));
            }
            json!({ "@type": "g:Map", "@value": flat })
        }
    }
}

// ── Responses ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    #[serde(default)]
    pub request_id: Value,
    pub status: ResponseStatus,
    #[serde(default)]
    pub result: ResponseResult,
}

#[derive(Debug, Deserialize)]
pub struct ResponseStatus {
    pub code: u16,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseResult {
    #[serde(default)]
    pub data: Value,
}

/// What a single response frame means for its request's stream.
#[derive(Debug)]
pub enum Outcome {
    /// More frames follow.
    Partial(Vec<Value>),
    /// Last frame for this request.
    Complete(Vec<Value>),
    Failed(GremlinError),
}

impl ResponseMessage {
    pub fn decode(payload: &[u8]) -> Result<Self, GremlinError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// The request id, accepting both plain and `g:UUID` typed forms.
    pub fn request_id(&self) -> Option<Uuid> {
        let raw = match &self.request_id {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => obj.get("@value")?.as_str()?,
            _ => return None,
        };
        Uuid::parse_str(raw).ok()
    }

    pub fn into_outcome(self) -> Outcome {
        match self.status.code {
            status::PARTIAL_CONTENT => Outcome::Partial(records(self.result.data)),
            status::SUCCESS => Outcome::Complete(records(self.result.data)),
            status::NO_CONTENT => Outcome::Complete(Vec::new()),
            code => Outcome::Failed(GremlinError::Server {
                code,
                message: self.status.message.unwrap_or_default(),
            }),
        }
    }
}

/// Split a response `data` payload into individual records.
fn records(data: Value) -> Vec<Value> {
    match data {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(mut obj) if obj.get("@type").and_then(Value::as_str) == Some("g:List") => {
            match obj.remove("@value") {
                Some(Value::Array(items)) => items,
                Some(other) => vec![other],
                None => Vec::new(),
            }
        }
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_frame(frame: &[u8]) -> (String, Value) {
        let len = frame[0] as usize;
        let mime = String::from_utf8(frame[1..1 + len].to_vec()).unwrap();
        let body = serde_json::from_slice(&frame[1 + len..]).unwrap();
        (mime, body)
    }

    #[test]
    fn test_encode_query_only() {
        let id = Uuid::new_v4();
        let frame = encode_request(id, "g.V().limit(1)", None).unwrap();
        let (mime, body) = decode_frame(&frame);

        assert_eq!(mime, MIME_TYPE);
        assert_eq!(body["requestId"]["@type"], "g:UUID");
        assert_eq!(body["requestId"]["@value"], id.to_string());
        assert_eq!(body["op"], "eval");
        assert_eq!(body["args"]["gremlin"], "g.V().limit(1)");
        assert_eq!(body["args"]["language"], LANGUAGE);
        assert!(body["args"].get("bindings").is_none());
    }

    #[test]
    fn test_encode_with_bindings() {
        let mut bindings = Bindings::new();
        bindings.insert("name".to_string(), json!("marko"));
        bindings.insert("limit".to_string(), json!(2));

        let frame = encode_request(Uuid::new_v4(), "g.V().has('name', name)", Some(&bindings))
            .unwrap();
        let (_, body) = decode_frame(&frame);

        assert_eq!(body["args"]["bindings"]["name"], "marko");
        assert_eq!(
            body["args"]["bindings"]["limit"],
            json!({"@type": "g:Int64", "@value": 2})
        );
    }

    #[test]
    fn test_graphson_typing() {
        assert_eq!(to_graphson(&json!(true)), json!(true));
        assert_eq!(
            to_graphson(&json!(1.5)),
            json!({"@type": "g:Double", "@value": 1.5})
        );
        assert_eq!(
            to_graphson(&json!(["a", 1])),
            json!({"@type": "g:List", "@value": ["a", {"@type": "g:Int64", "@value": 1}]})
        );
        assert_eq!(
            to_graphson(&json!(u64::MAX)),
            json!({"@type": "g:BigInteger", "@value": u64::MAX})
        );
        assert_eq!(
            to_graphson(&json!({"k": null})),
            json!({"@type": "g:Map", "@value": ["k", null]})
        );
    }

    #[test]
    fn test_decode_partial_list() {
        let id = Uuid::new_v4();
        let payload = json!({
            "requestId": id.to_string(),
            "status": {"code": 206, "message": "", "attributes": {}},
            "result": {"data": {"@type": "g:List", "@value": [1, 2]}, "meta": {}}
        });
        let msg = ResponseMessage::decode(payload.to_string().as_bytes()).unwrap();
        assert_eq!(msg.request_id(), Some(id));
        match msg.into_outcome() {
            Outcome::Partial(records) => assert_eq!(records, vec![json!(1), json!(2)]),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_decode_typed_request_id() {
        let id = Uuid::new_v4();
        let payload = json!({
            "requestId": {"@type": "g:UUID", "@value": id.to_string()},
            "status": {"code": 204},
            "result": {"data": null}
        });
        let msg = ResponseMessage::decode(payload.to_string().as_bytes()).unwrap();
        assert_eq!(msg.request_id(), Some(id));
        assert!(matches!(msg.into_outcome(), Outcome::Complete(ref r) if r.is_empty()));
    }

    #[test]
    fn test_decode_server_error() {
        let payload = json!({
            "requestId": Uuid::new_v4().to_string(),
            "status": {"code": 597, "message": "No such property: x"},
            "result": {"data": null}
        });
        let msg = ResponseMessage::decode(payload.to_string().as_bytes()).unwrap();
        match msg.into_outcome() {
            Outcome::Failed(GremlinError::Server { code, message }) => {
                assert_eq!(code, 597);
                assert_eq!(message, "No such property: x");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_scalar_data_is_one_record() {
        assert_eq!(records(json!(42)), vec![json!(42)]);
        assert_eq!(records(json!(["a", "b"])).len(), 2);
    }
}
