use std::sync::Arc;

use anyhow::Result;
use hyper::{header, Body, Method, Request, Response};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use pizzeria::stats::{StatsReport, SubmitReply};

use crate::{
    config::Config,
    db::Db,
    error::ApiError,
    gate::{AccessGate, FORWARDED_FOR},
    validation::parse_submission,
};

pub const RESULTS_PATH: &str = "/game-results";

fn my_response<T>(status: u16, content_type: Option<&str>, body: T) -> Response<Body>
where
    Body: From<T>,
{
    let mut builder = Response::builder()
        .status(status)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body.into()).expect("This shouldn't fail.")
}

fn json_response<T: Serialize>(status: u16, body: &T) -> Response<Body> {
    match serde_json::to_string(body) {
        Ok(s) => my_response(status, Some("application/json"), s),
        Err(e) => error_response(ApiError::Storage(e.into())),
    }
}

fn error_response(e: ApiError) -> Response<Body> {
    match &e {
        ApiError::Storage(inner) => warn!("Request failed: {:#}", inner),
        _ => debug!("Turned a request down: {}", e),
    }
    json_response(e.status(), &e.body())
}

pub async fn stats_service(
    _config: Arc<Config>,
    db: Arc<Db>,
    gate: Arc<AccessGate>,
    req: Request<Body>,
) -> Result<Response<Body>> {
    let forwarded_for = req
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok());
    if !gate.permits(forwarded_for) {
        info!("Blocked a request from {:?}", forwarded_for);
        return Ok(error_response(ApiError::Forbidden));
    }
    if req.method() == Method::OPTIONS {
        return Ok(my_response(200, None, Body::empty()));
    }
    if req.uri().path() != RESULTS_PATH {
        return Ok(error_response(ApiError::NotFound));
    }
    let response = match *req.method() {
        Method::POST => {
            let full_body = hyper::body::to_bytes(req.into_body()).await?;
            save_run(db, &full_body).await
        }
        Method::GET => load_stats(db).await,
        _ => Err(ApiError::MethodNotAllowed),
    };
    Ok(response.unwrap_or_else(error_response))
}

#[instrument(name = "Saving a game run", skip_all)]
async fn save_run(db: Arc<Db>, raw: &[u8]) -> Result<Response<Body>, ApiError> {
    let submission = parse_submission(raw)?;
    let run = db.insert_run(&submission)?;
    info!("Stored {} run {}", run.game_type, run.document_id);
    let reply = SubmitReply {
        success: true,
        document_id: run.document_id.clone(),
        message: "Game run data saved successfully".into(),
        data: run,
    };
    Ok(json_response(200, &reply))
}

#[instrument(name = "Loading statistics", skip_all)]
async fn load_stats(db: Arc<Db>) -> Result<Response<Body>, ApiError> {
    let runs = db.get_runs()?;
    debug!("Aggregating {} runs", runs.len());
    Ok(json_response(200, &StatsReport::from_runs(&runs)))
}
