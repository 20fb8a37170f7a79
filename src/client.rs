use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::backend::{CompletionClient, CompletionRequest, ModelCatalog};
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ModelListResponse};

/// Base URL of Groq's OpenAI-compatible API.
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";
/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Groq API.
#[derive(Clone)]
pub struct Groq {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl Groq {
    /// Create a new Groq client.
    ///
    /// The API key can be provided directly or read from the GROQ_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_VAR).map_err(|_| {
                Error::authentication(
                    "API key not provided and GROQ_API_KEY environment variable not set",
                )
            })?,
        };
        if api_key.trim().is_empty() {
            return Err(Error::authentication("API key is empty"));
        }

        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request and decoded response.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(e.to_string(), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        // OpenAI-style error envelope
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            param: Option<String>,
            code: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let error_message = detail
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| error_body.clone());
        let error_param = detail.as_ref().and_then(|e| e.param.clone());
        let error_code = detail.as_ref().and_then(|e| e.code.clone());

        map_status(
            status_code,
            error_type,
            error_message,
            error_param,
            error_code,
            retry_after,
        )
    }

    async fn execute<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.execute_inner(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if result.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }
        result
    }

    async fn execute_inner<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .headers(self.default_headers()?)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// List the models available to this API key.
    pub async fn list_models_response(&self) -> Result<ModelListResponse> {
        let url = self.endpoint("models")?;
        let response: ModelListResponse = self.execute(self.client.get(url)).await?;
        if let Some(logger) = &self.logger {
            logger.log_models(&response);
        }
        Ok(response)
    }

    /// Send a chat completion request and wait for the whole reply.
    pub async fn create_chat_completion(
        &self,
        params: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = self.endpoint("chat/completions")?;
        if let Some(logger) = &self.logger {
            logger.log_request(params);
        }
        let response: ChatCompletionResponse =
            self.execute(self.client.post(url).json(params)).await?;
        if let Some(logger) = &self.logger {
            logger.log_response(&response);
        }
        Ok(response)
    }
}

impl fmt::Debug for Groq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Groq")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ModelCatalog for Groq {
    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.list_models_response().await?.model_ids())
    }
}

#[async_trait::async_trait]
impl CompletionClient for Groq {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let params = ChatCompletionRequest::new(request.model.clone(), request.into_messages());
        let response = self.create_chat_completion(&params).await?;
        if response.choices.is_empty() {
            return Err(Error::serialization(
                "completion response contained no choices",
                None,
            ));
        }
        Ok(response.text().unwrap_or_default().to_string())
    }
}

/// Parses a base URL, adding the trailing slash `Url::join` needs.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let url = if raw.ends_with('/') {
        Url::parse(raw)?
    } else {
        Url::parse(&format!("{raw}/"))?
    };
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::validation(
            format!("unsupported URL scheme {scheme:?}"),
            Some("base_url".to_string()),
        )),
    }
}

/// Map HTTP status code to appropriate error type
fn map_status(
    status_code: u16,
    error_type: Option<String>,
    message: String,
    param: Option<String>,
    code: Option<String>,
    retry_after: Option<u64>,
) -> Error {
    match status_code {
        400 | 422 => Error::bad_request(message, param),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message, code),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, error_type, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Groq::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url().as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);

        let client = Groq::with_options(
            Some("test-key".to_string()),
            Some("https://proxy.example.com/openai/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://proxy.example.com/openai/v1/"
        );
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(
            client.endpoint("chat/completions").unwrap().as_str(),
            "https://proxy.example.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn empty_key_rejected() {
        let err = Groq::new(Some("   ".to_string())).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn bad_base_url_rejected() {
        let err = Groq::with_options(Some("k".to_string()), Some("not a url".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));

        let err = Groq::with_options(
            Some("k".to_string()),
            Some("ftp://example.com/".to_string()),
            None,
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn authorization_header_uses_bearer() {
        let client = Groq::new(Some("gsk_abc".to_string())).unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer gsk_abc");
    }

    #[test]
    fn debug_hides_api_key() {
        let client = Groq::new(Some("gsk_secret".to_string())).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("gsk_secret"));
        assert!(debug.contains("api.groq.com"));
    }

    #[test]
    fn status_mapping() {
        let msg = || "m".to_string();
        assert!(map_status(401, None, msg(), None, None, None).is_authentication());
        assert!(matches!(
            map_status(400, None, msg(), Some("model".to_string()), None, None),
            Error::BadRequest { param: Some(p), .. } if p == "model"
        ));
        assert!(
            map_status(404, None, msg(), None, Some("model_not_found".to_string()), None)
                .is_not_found()
        );
        assert!(matches!(
            map_status(429, None, msg(), None, None, Some(7)),
            Error::RateLimit { retry_after: Some(7), .. }
        ));
        assert!(map_status(503, None, msg(), None, None, None).is_server_error());
        assert_eq!(
            map_status(418, None, msg(), None, None, None).status_code(),
            Some(418)
        );
    }
}
