/// Network boundary for the caching layer
///
/// Requests and responses are plain owned structs so entries can be
/// cloned into the store while the original response still goes back to
/// the caller. The backend is a trait so tests inject scripted traffic
/// and the service never talks to an ambient global client.
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::core::{ CacheError, CacheResult };

/// How the request entered the site: a navigation (document load) or a
/// subresource fetch. Navigations get the offline fallback page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    Subresource,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub mode: RequestMode,
}

impl FetchRequest {
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_uppercase(),
            url,
            headers: Vec::new(),
            mode: RequestMode::Subresource,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_lowercase(), value.to_string()));
        self
    }

    pub fn navigate(mut self) -> Self {
        self.mode = RequestMode::Navigate;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Case-insensitive request header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    /// Header names lowercased at capture time
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Set when the response was served from the store, not the network
    pub from_cache: bool,
}

impl FetchResponse {
    pub fn new(status: u16, status_text: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            headers: HashMap::new(),
            body,
            from_cache: false,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    /// 2xx-class success flag; only these responses are ever stored
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|v| v.as_str())
    }
}

/// Network side of every strategy
#[async_trait]
pub trait NetworkBackend: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> CacheResult<FetchResponse>;
}

/// HTTP backend over a single pre-built reqwest client
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new(timeout_secs: u64) -> CacheResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CacheError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl NetworkBackend for HttpBackend {
    async fn fetch(&self, request: &FetchRequest) -> CacheResult<FetchResponse> {
        let method = reqwest::Method
            ::from_bytes(request.method.as_bytes())
            .map_err(|e| CacheError::Http(format!("Invalid method {}: {}", request.method, e)))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send().await
            .map_err(|e| CacheError::Network(e.to_string()))?;

        let status = response.status();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), value.to_string());
            }
        }

        let body = response
            .bytes().await
            .map_err(|e| CacheError::Network(e.to_string()))?
            .to_vec();

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
            from_cache: false,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted network backend for strategy and lifecycle tests.

    use super::*;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    /// Backend that replays queued responses per URL and counts calls.
    /// An optional delay simulates network latency for race tests.
    pub struct ScriptedBackend {
        responses: Mutex<HashMap<String, VecDeque<CacheResult<FetchResponse>>>>,
        calls: Mutex<HashMap<String, usize>>,
        total_calls: AtomicUsize,
        delay: Mutex<Option<Duration>>,
    }

    impl ScriptedBackend {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(HashMap::new()),
                total_calls: AtomicUsize::new(0),
                delay: Mutex::new(None),
            }
        }

        pub fn push(&self, url: &str, result: CacheResult<FetchResponse>) {
            self.responses
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(result);
        }

        pub fn push_ok(&self, url: &str, body: &str) {
            self.push(url, Ok(dated_response(200, body)));
        }

        pub fn push_err(&self, url: &str) {
            self.push(url, Err(CacheError::Network("connection refused".to_string())));
        }

        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = Some(delay);
        }

        pub fn calls_for(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.total_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NetworkBackend for ScriptedBackend {
        async fn fetch(&self, request: &FetchRequest) -> CacheResult<FetchResponse> {
            let url = request.url.to_string();
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            *self.calls.lock().unwrap().entry(url.clone()).or_insert(0) += 1;

            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let next = self.responses.lock().unwrap().get_mut(&url).and_then(|q| q.pop_front());
            match next {
                Some(result) => result,
                None => Err(CacheError::Network(format!("no scripted response for {}", url))),
            }
        }
    }

    /// 200 response carrying a current RFC 2822 Date header
    pub fn dated_response(status: u16, body: &str) -> FetchResponse {
        FetchResponse::new(status, "OK", body.as_bytes().to_vec()).with_header(
            "date",
            &Utc::now().to_rfc2822()
        )
    }

    pub fn parse_url(url: &str) -> Url {
        Url::parse(url).unwrap()
    }
}
