// Verify the JSON shapes the embedded page and curl clients rely on.

use chatcast_protocol::frames::{ChatMessage, ErrorBody};

#[test]
fn chat_message_field_names() {
    let json = r#"{"user_id":"u1","message":"hi"}"#;
    let msg: ChatMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg, ChatMessage::new("u1", "hi"));
}

#[test]
fn encode_produces_compact_json() {
    let payload = ChatMessage::new("u1", "hi").encode().unwrap();
    assert_eq!(&payload[..], br#"{"user_id":"u1","message":"hi"}"#);
}

#[test]
fn decode_reads_encoded_payload() {
    let payload = ChatMessage::new("alice", "line one\nline two").encode().unwrap();
    let msg = ChatMessage::decode(&payload).unwrap();
    assert_eq!(msg.user_id, "alice");
    assert_eq!(msg.message, "line one\nline two");
}

#[test]
fn encoded_payload_is_single_line() {
    // SSE splits multi-line data into several `data:` fields; JSON escapes
    // keep every record on one line.
    let payload = ChatMessage::new("u1", "a\nb\r\nc").encode().unwrap();
    assert!(!payload.contains(&b'\n'));
    assert!(!payload.contains(&b'\r'));
}

#[test]
fn unknown_fields_are_ignored() {
    let json = r#"{"user_id":"u1","message":"hi","room":"lobby"}"#;
    let msg: ChatMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.message, "hi");
}

#[test]
fn missing_field_is_rejected() {
    let json = r#"{"user_id":"u1"}"#;
    assert!(serde_json::from_str::<ChatMessage>(json).is_err());
    assert!(ChatMessage::decode(json.as_bytes()).is_err());
}

#[test]
fn error_body_omits_absent_code() {
    let json = serde_json::to_string(&ErrorBody::new("bad json")).unwrap();
    assert_eq!(json, r#"{"error":"bad json"}"#);

    let json = serde_json::to_string(&ErrorBody::new("bad json").with_code("BAD_REQUEST")).unwrap();
    assert!(json.contains(r#""code":"BAD_REQUEST""#));
}
