//! # View Reporter
//!
//! Client half of the view counter.
//!
//! A content page tells the counter it was viewed and moves on:
//! - One POST per (unit, slug) activation, body `{"unit": .., "slug": ..}`
//! - Same pair again while still active: nothing is sent
//! - Pair changes: a new report goes out
//! - No retries, the response is never inspected, failures only show up in `debug` logs
//!
//! [`ViewReporter::report`] spawns the request, so it must be called inside a Tokio runtime.
use std::sync::{Mutex, PoisonError};

use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:1111/api/incr";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub unit: String,
    pub slug: String,
}

pub struct ViewReporter {
    client: Client,
    endpoint: String,
    active: Mutex<Option<View>>,
}

impl ViewReporter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            active: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fire and forget. Does nothing if `(unit, slug)` is already the active pair.
    pub fn report(&self, unit: &str, slug: &str) {
        let Some(view) = self.activate(unit, slug) else {
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            match send_view(&client, &endpoint, &view).await {
                Ok(response) => debug!(
                    unit = %view.unit,
                    slug = %view.slug,
                    status = %response.status(),
                    "View reported"
                ),
                Err(e) => debug!(unit = %view.unit, slug = %view.slug, "View report failed: {e}"),
            }
        });
    }

    /// Forgets the active pair, the next report always goes out.
    pub fn reset(&self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn activate(&self, unit: &str, slug: &str) -> Option<View> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if active
            .as_ref()
            .is_some_and(|view| view.unit == unit && view.slug == slug)
        {
            return None;
        }

        let view = View {
            unit: unit.to_string(),
            slug: slug.to_string(),
        };
        *active = Some(view.clone());

        Some(view)
    }
}

/// One awaited report, for callers that do want the response.
pub async fn send_view(client: &Client, endpoint: &str, view: &View) -> reqwest::Result<Response> {
    client
        .post(endpoint)
        .header(CONTENT_TYPE, "application/json")
        .json(view)
        .send()
        .await
}
