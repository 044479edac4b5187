use anyhow::Result;
use app::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("app=debug")
        .init();
    info!("Loading config file...");
    let config = Config::from_file("./config/stats.toml")?;
    let my_app = app::App::new(config);
    my_app.serve().await
}
