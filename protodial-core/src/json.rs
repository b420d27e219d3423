//! JSON <-> [`DynamicMessage`] conversion at the edge of the core.
//!
//! Uses the canonical proto3 JSON mapping provided by `prost-reflect`:
//!
//! * Decoding ignores object keys that do not match any field of the message.
//! * Encoding is pretty printed with two-space indentation and emits every field, including
//!   those left at their default value, so the output always shows the full message shape.
use prost_reflect::{DeserializeOptions, DynamicMessage, MessageDescriptor, SerializeOptions};

#[derive(Debug, thiserror::Error)]
#[error("JSON does not match message '{message}': '{source}'")]
pub struct DecodeError {
    pub message: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to render message as JSON: '{0}'")]
    Json(#[from] serde_json::Error),
    #[error("Rendered JSON is not valid UTF-8: '{0}'")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Parses `json` into a message of type `desc`, dropping unknown keys.
pub fn decode_message(desc: MessageDescriptor, json: &str) -> Result<DynamicMessage, DecodeError> {
    let message = desc.full_name().to_string();
    let options = DeserializeOptions::new().deny_unknown_fields(false);

    let mut deserializer = serde_json::Deserializer::from_str(json);

    let decoded = DynamicMessage::deserialize_with_options(desc, &mut deserializer, &options)
        .and_then(|decoded| deserializer.end().map(|_| decoded))
        .map_err(|source| DecodeError { message, source })?;

    Ok(decoded)
}

/// Renders `message` as multi-line JSON including default-valued fields.
pub fn encode_message(message: &DynamicMessage) -> Result<String, EncodeError> {
    let options = SerializeOptions::new().skip_default_fields(false);

    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::pretty(&mut buf);
    message.serialize_with_options(&mut serializer, &options)?;

    Ok(String::from_utf8(buf)?)
}
