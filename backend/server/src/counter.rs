//! # View Counting
//!
//! One view event goes through at most two store calls:
//!
//! 1. No visitor address: skip straight to the increment, a missing address never blocks counting
//! 2. Otherwise hash the address and try to create `deduplicate:{digest}:{slug}` with the window TTL
//! 3. Marker already there: the visitor was counted for this slug inside the window, stop
//! 4. `INCR pageviews:{unit}:{slug}`
//!
//! The raw address never reaches the store, only its SHA-256 digest.
use std::{net::IpAddr, time::Duration};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{database::ViewStore, error::AppError, utils::View};

pub const DEDUP_NAMESPACE: &str = "deduplicate";
pub const PAGEVIEWS_NAMESPACE: &str = "pageviews";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Counted,
    Deduplicated,
}

/// Lowercase hex SHA-256 of the textual address.
pub fn hash_address(address: IpAddr) -> String {
    hex::encode(Sha256::digest(address.to_string().as_bytes()))
}

pub fn dedup_key(digest: &str, slug: &str) -> String {
    [DEDUP_NAMESPACE, digest, slug].join(":")
}

pub fn pageviews_key(unit: &str, slug: &str) -> String {
    [PAGEVIEWS_NAMESPACE, unit, slug].join(":")
}

pub async fn record_view(
    store: &dyn ViewStore,
    view: &View,
    address: Option<IpAddr>,
    ttl: Duration,
) -> Result<Outcome, AppError> {
    if let Some(address) = address {
        let marker = dedup_key(&hash_address(address), &view.slug);

        if !store.set_if_absent(&marker, ttl).await? {
            debug!(unit = %view.unit, slug = %view.slug, "Duplicate view skipped");

            return Ok(Outcome::Deduplicated);
        }
    }

    let count = store
        .increment(&pageviews_key(&view.unit, &view.slug))
        .await?;

    debug!(unit = %view.unit, slug = %view.slug, count, "View counted");

    Ok(Outcome::Counted)
}
