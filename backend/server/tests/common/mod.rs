#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use redis::{ErrorKind, RedisError, RedisResult};
use reqwest::Client;
use server::{app, config::Config, database::ViewStore, state::AppState};
use tokio::{net::TcpListener, task::JoinHandle, time::Instant};

/// Store double with Redis semantics for `SET NX EX` and `INCR`. Expiry follows tokio time so
/// paused tests can jump past the window.
#[derive(Default)]
pub struct MemoryStore {
    markers: Mutex<HashMap<String, Instant>>,
    counters: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self, key: &str) -> i64 {
        self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn marker_keys(&self) -> Vec<String> {
        self.markers.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ViewStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> RedisResult<bool> {
        let now = Instant::now();
        let mut markers = self.markers.lock().unwrap();

        if markers.get(key).is_some_and(|expires_at| *expires_at > now) {
            return Ok(false);
        }

        markers.insert(key.to_string(), now + ttl);

        Ok(true)
    }

    async fn increment(&self, key: &str) -> RedisResult<i64> {
        let mut counters = self.counters.lock().unwrap();
        let count = counters.entry(key.to_string()).or_insert(0);
        *count += 1;

        Ok(*count)
    }
}

/// Store that is always unreachable.
pub struct FailingStore;

#[async_trait]
impl ViewStore for FailingStore {
    async fn set_if_absent(&self, _key: &str, _ttl: Duration) -> RedisResult<bool> {
        Err(RedisError::from((ErrorKind::IoError, "connection refused")))
    }

    async fn increment(&self, _key: &str) -> RedisResult<i64> {
        Err(RedisError::from((ErrorKind::IoError, "connection refused")))
    }
}

/// Server bound to a random local port.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// With `peer_address` off the server does not expose connection info, so requests carry no
    /// visitor address.
    pub async fn start(config: Config, store: Arc<dyn ViewStore>, peer_address: bool) -> Self {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();

        let router = app(AppState::with_store(config, store));

        let handle = tokio::spawn(async move {
            if peer_address {
                let _ = axum::serve(
                    listener,
                    router.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .await;
            } else {
                let _ = axum::serve(listener, router).await;
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            client: Client::new(),
            _handle: handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
