use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::ConnectInfo,
    http::{Extensions, HeaderMap, header::CONTENT_TYPE},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::AppError::{self, MissingSlug, MissingUnit};

pub const JSON_MEDIA_TYPE: &str = "application/json";
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Body as sent by the reporter. Fields stay optional so a missing one maps to its own error,
/// while a present field of the wrong type fails the decode.
#[derive(Deserialize, Debug, Default)]
pub struct ViewPayload {
    pub unit: Option<String>,
    pub slug: Option<String>,
}

/// A validated view event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub unit: String,
    pub slug: String,
}

impl ViewPayload {
    pub fn validate(self) -> Result<View, AppError> {
        let unit = self.unit.filter(|unit| !unit.is_empty()).ok_or(MissingUnit)?;
        let slug = self.slug.filter(|slug| !slug.is_empty()).ok_or(MissingSlug)?;

        Ok(View { unit, slug })
    }
}

/// The body must be a JSON object. A repeated key keeps its last value.
pub fn parse_view(bytes: &[u8]) -> Result<View, AppError> {
    let object: Map<String, Value> = serde_json::from_slice(bytes)?;

    ViewPayload::deserialize(Value::Object(object))?.validate()
}

/// Compares the media type only, ignoring case and parameters such as `charset`.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

pub fn client_address(
    headers: &HeaderMap,
    extensions: &Extensions,
    trust_proxy: bool,
) -> Option<IpAddr> {
    let forwarded = if trust_proxy {
        forwarded_address(headers)
    } else {
        None
    };

    forwarded
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(peer)| peer.ip())
        })
        .map(|address| address.to_canonical())
}

fn forwarded_address(headers: &HeaderMap) -> Option<IpAddr> {
    // leftmost entry is the original client
    header_str(headers, FORWARDED_FOR)
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| header_str(headers, REAL_IP).and_then(|value| value.trim().parse().ok()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
