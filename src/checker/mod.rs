pub mod body;
pub mod response;
pub mod transport;

use crate::editor::is_blank;
use crate::error::CheckError;
use crate::Match;
use body::{BodySerializer, FormBody};
use response::{CheckResponse, OffsetEncoding};
use std::collections::BTreeMap;
use transport::{HttpRequest, HttpTransport, Transport};

pub const DEFAULT_SERVER: &str = "https://api.languagetool.org/v2/check";

/// Client for a remote spell/grammar checking service.
pub struct CheckerClient<T = HttpTransport> {
    transport: T,
    url: String,
    method: String,
    language: String,
    headers: BTreeMap<String, String>,
    options: BTreeMap<String, String>,
    serializer: Box<dyn BodySerializer>,
    offset_encoding: OffsetEncoding,
    require_replacements: bool,
}

impl CheckerClient<HttpTransport> {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_transport(HttpTransport::new(), url)
    }
}

impl<T: Transport> CheckerClient<T> {
    pub fn with_transport(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            method: "POST".to_string(),
            language: "auto".to_string(),
            headers: BTreeMap::new(),
            options: BTreeMap::new(),
            serializer: Box::new(FormBody),
            offset_encoding: OffsetEncoding::default(),
            require_replacements: true,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Extra provider field sent alongside `text` and `language`.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn serializer(mut self, serializer: Box<dyn BodySerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn offset_encoding(mut self, encoding: OffsetEncoding) -> Self {
        self.offset_encoding = encoding;
        self
    }

    pub fn require_replacements(mut self, require: bool) -> Self {
        self.require_replacements = require;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request the client would send for `text`.
    pub fn build_request(&self, text: &str) -> HttpRequest {
        let mut fields: Vec<(&str, &str)> = vec![("text", text), ("language", self.language.as_str())];
        fields.extend(
            self.options
                .iter()
                .filter(|(name, _)| name.as_str() != "text" && name.as_str() != "language")
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );

        let mut headers: Vec<(String, String)> = vec![(
            "Content-Type".to_string(),
            self.serializer.content_type().to_string(),
        )];
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-type") {
                headers[0].1 = value.clone();
            } else {
                headers.push((name.clone(), value.clone()));
            }
        }

        HttpRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers,
            body: self.serializer.serialize(&fields),
        }
    }

    /// Check `text`. Blank text never reaches the network.
    pub async fn check(&self, text: &str) -> Result<Vec<Match>, CheckError> {
        if is_blank(text) {
            tracing::debug!("document is blank, skipping check");
            return Ok(Vec::new());
        }

        let response = self.transport.send(self.build_request(text)).await?;
        if !response.is_success() {
            return Err(CheckError::Status {
                status: response.status,
            });
        }

        let decoded: CheckResponse = serde_json::from_slice(&response.body)?;
        let matches = response::normalize(
            text,
            decoded,
            self.offset_encoding,
            self.require_replacements,
        );
        tracing::debug!(count = matches.len(), "checking service returned matches");
        Ok(matches)
    }

    /// Like [`CheckerClient::check`], but a failure is logged and reported as no matches.
    pub async fn check_or_empty(&self, text: &str) -> Vec<Match> {
        match self.check(text).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "spell check failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use transport::HttpResponse;

    /// Replays canned responses and records every request.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub responses: Mutex<VecDeque<Result<HttpResponse, CheckError>>>,
        pub requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub fn replying(status: u16, body: &str) -> Self {
            let transport = Self::default();
            transport.push(status, body);
            transport
        }

        pub fn push(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }));
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, CheckError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CheckError::InvalidRequest("no scripted response".into())))
        }
    }

    #[test]
    fn test_build_request_defaults() {
        let client = CheckerClient::with_transport(ScriptedTransport::default(), DEFAULT_SERVER)
            .option("disabledCategories", "TYPOGRAPHY");
        let request = client.build_request("Ths is");

        assert_eq!(request.method, "POST");
        assert_eq!(request.url, DEFAULT_SERVER);
        assert_eq!(
            request.headers,
            vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string()
            )]
        );
        assert_eq!(
            String::from_utf8(request.body).unwrap(),
            "text=Ths%20is&language=auto&disabledCategories=TYPOGRAPHY"
        );
    }

    #[test]
    fn test_build_request_overrides() {
        let client = CheckerClient::with_transport(ScriptedTransport::default(), "http://local/check")
            .language("en-US")
            .serializer(Box::new(body::JsonBody))
            .header("Authorization", "Bearer x")
            .header("content-type", "application/vnd.custom+json");
        let request = client.build_request("hi");

        assert_eq!(request.headers[0].1, "application/vnd.custom+json");
        assert_eq!(request.headers[1].0, "Authorization");
        let value: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(value["language"], "en-US");
    }

    #[tokio::test]
    async fn test_blank_text_skips_network() {
        let client = CheckerClient::with_transport(ScriptedTransport::default(), DEFAULT_SERVER);
        for text in ["", "   ", "\n\t\r\n"] {
            assert!(client.check(text).await.unwrap().is_empty());
        }
        assert_eq!(client.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn test_check_success() {
        let transport = ScriptedTransport::replying(
            200,
            r#"{"matches": [{"offset": 0, "length": 3, "message": "Possible typo",
                "replacements": [{"value": "This"}], "rule": {"id": "MORFOLOGIK_RULE_EN_US"}}]}"#,
        );
        let client = CheckerClient::with_transport(transport, DEFAULT_SERVER);

        let matches = client.check("Ths is a test.").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].replacements, vec!["This".to_string()]);
        assert_eq!(matches[0].rule.id, "MORFOLOGIK_RULE_EN_US");
    }

    #[tokio::test]
    async fn test_failures_are_typed() {
        let transport = ScriptedTransport::replying(500, "oops");
        transport.push(200, "not json");
        let client = CheckerClient::with_transport(transport, DEFAULT_SERVER);

        let err = client.check("text").await.unwrap_err();
        assert!(matches!(err, CheckError::Status { status: 500 }));
        let err = client.check("text").await.unwrap_err();
        assert!(matches!(err, CheckError::Decode(_)));
        assert!(client.check_or_empty("text").await.is_empty());
    }
}
