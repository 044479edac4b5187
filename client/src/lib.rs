pub mod config;
pub mod game;
pub mod view;

use anyhow::{bail, Result};
use hyper::{client::HttpConnector, Body, Client, Method, Request};
use pizzeria::stats::{GameRunSubmission, StatsReport, SubmitReply};
use serde_derive::Deserialize;

pub const RESULTS_PATH: &str = "/game-results";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: Option<String>,
}

pub struct StatsClient {
    client: Client<HttpConnector>,
    entry_point: String,
}

impl StatsClient {
    /// `base_url` is the API root such as http://localhost:3000
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            entry_point: format!("{}{}", base_url.trim_end_matches('/'), RESULTS_PATH),
        }
    }

    async fn request(&self, method: Method, body: Body) -> Result<Vec<u8>> {
        let req = Request::builder()
            .method(method)
            .uri(&self.entry_point)
            .header("Content-Type", "application/json")
            .body(body)?;
        let res = self.client.request(req).await?;
        let status = res.status();
        let full_body = hyper::body::to_bytes(res.into_body()).await?;
        if !status.is_success() {
            match serde_json::from_slice::<ErrorBody>(&full_body) {
                Ok(ErrorBody {
                    error,
                    message: Some(message),
                }) => bail!("HTTP error! status: {}: {} ({})", status, error, message),
                Ok(ErrorBody { error, .. }) => bail!("HTTP error! status: {}: {}", status, error),
                Err(_) => bail!("HTTP error! status: {}", status),
            }
        }
        Ok(full_body.to_vec())
    }

    pub async fn submit(&self, run: &GameRunSubmission) -> Result<SubmitReply> {
        let body = serde_json::to_vec(run)?;
        let bytes = self.request(Method::POST, body.into()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn fetch_stats(&self) -> Result<StatsReport> {
        let bytes = self.request(Method::GET, Body::empty()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
