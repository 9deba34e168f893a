use stock_watch::app;
use stock_watch::config::{load_config, Config};
use stock_watch::utils::init_file_logger;
use stock_watch::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config(&Config::default_path())?;
    init_file_logger(&config.log_file)?;
    app::run(config).await
}
