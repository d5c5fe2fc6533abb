use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::Coordinate;

/// Coarse "where am I" lookup used when the user leaves the start blank.
#[async_trait]
pub trait IpLocator: Send + Sync {
    /// Any failure reads as `None`.
    async fn locate(&self) -> Option<Coordinate>;
}

pub struct IpInfoLocator {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpInfoPayload {
    #[serde(default)]
    loc: Option<String>,
}

impl IpInfoLocator {
    pub const TIMEOUT: Duration = Duration::from_secs(6);

    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn fetch(&self) -> Result<Option<Coordinate>, reqwest::Error> {
        let url = format!("{}/json", self.base_url.trim_end_matches('/'));
        let payload: IpInfoPayload = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(payload.loc.as_deref().and_then(parse_loc))
    }
}

#[async_trait]
impl IpLocator for IpInfoLocator {
    async fn locate(&self) -> Option<Coordinate> {
        match self.fetch().await {
            Ok(coord) => {
                if coord.is_none() {
                    tracing::warn!("IP lookup answered without a usable `loc` field");
                }
                coord
            }
            Err(err) => {
                tracing::warn!("IP lookup failed: {err}");
                None
            }
        }
    }
}

/// Parse the `"lat,lon"` string reported by ipinfo.
pub fn parse_loc(raw: &str) -> Option<Coordinate> {
    let (lat, lon) = raw.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    Some(Coordinate { lat, lon })
}
