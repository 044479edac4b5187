pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod service;
pub mod validation;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use tracing::{error, info};

use crate::config::Config;
use crate::db::Db;
use crate::gate::AccessGate;
use crate::service::stats_service;

pub struct App {
    config: Arc<Config>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub async fn serve(&self) -> Result<()> {
        info!("Initializing the application...");
        info!("Setting up database connection...");
        let db = Arc::new(
            Db::init(&self.config.storage.db_file)
                .context("Something went wrong when connecting the database")?,
        );
        let gate = Arc::new(AccessGate::new(&self.config.gate));
        if gate.is_open() {
            info!("No allowed_ips configured, the gate is open.");
        }

        info!("Making a service...");
        let addr = SocketAddr::from_str(&format!(
            "{}:{}",
            self.config.network.ip, self.config.network.port
        ))
        .context("Please use a correct ip and port")?;
        let config = self.config.clone();
        let make_svc = make_service_fn(move |_conn| {
            let config = config.clone();
            let db = db.clone();
            let gate = gate.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    stats_service(config.clone(), db.clone(), gate.clone(), req)
                }))
            }
        });
        let server = Server::try_bind(&addr)?.serve(make_svc);

        info!("Serving on {}", addr);
        if let Err(e) = server.await {
            error!("server error: {}", e);
        }
        Ok(())
    }
}
