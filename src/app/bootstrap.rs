use std::sync::Arc;

use log::info;

use crate::app::{controller::AppController, state::WatchState};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::MarketDataClient;

/// Entry point used by `main` to bootstrap the controller stack.
pub async fn run(config: Config) -> Result<()> {
    let client = Arc::new(MarketDataClient::from_config(&config.provider)?);
    info!(
        "Using provider {} (timeout {:?}, debounce {:?})",
        config.provider.base_url, config.provider.request_timeout, config.search.debounce
    );

    let state = WatchState::new(&config, client)?;
    AppController::new(state).run().await
}
