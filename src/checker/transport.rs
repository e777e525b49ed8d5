use crate::error::CheckError;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One network round trip to the checking service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, CheckError>;
}

/// [`Transport`] over a shared `reqwest` client. Timeouts are the client's defaults.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, CheckError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| CheckError::InvalidRequest(format!("bad method {}", request.method)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_method_is_rejected() {
        let transport = HttpTransport::new();
        let err = transport
            .send(HttpRequest {
                method: "NOT A METHOD".to_string(),
                url: "http://127.0.0.1:9/".to_string(),
                headers: Vec::new(),
                body: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::InvalidRequest(_)));
    }

    #[test]
    fn test_success_range() {
        let ok = HttpResponse {
            status: 204,
            body: Vec::new(),
        };
        let err = HttpResponse {
            status: 500,
            body: Vec::new(),
        };
        assert!(ok.is_success());
        assert!(!err.is_success());
    }
}
