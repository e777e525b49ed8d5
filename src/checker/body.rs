use serde::{Deserialize, Serialize};

/// Turns the ordered request fields into a request body.
pub trait BodySerializer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn serialize(&self, fields: &[(&str, &str)]) -> Vec<u8>;
}

/// `key=value&key=value` with percent-encoded values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBody;

impl BodySerializer for FormBody {
    fn content_type(&self) -> &'static str {
        "application/x-www-form-urlencoded"
    }

    fn serialize(&self, fields: &[(&str, &str)]) -> Vec<u8> {
        fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
            .into_bytes()
    }
}

/// A flat JSON object of string values.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody;

impl BodySerializer for JsonBody {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize(&self, fields: &[(&str, &str)]) -> Vec<u8> {
        let object: serde_json::Map<String, serde_json::Value> = fields
            .iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::from(*value)))
            .collect();
        serde_json::Value::Object(object).to_string().into_bytes()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Form,
    Json,
}

impl BodyFormat {
    pub fn serializer(self) -> Box<dyn BodySerializer> {
        match self {
            BodyFormat::Form => Box::new(FormBody),
            BodyFormat::Json => Box::new(JsonBody),
        }
    }
}
