use std::sync::Arc;

use api::AppState;
use axum::Router;

use crate::{
    config::Config,
    notifier::{Notifier, NotifyError},
    source::JsonDirCandleSource,
    worker::WatchWorker,
};

pub struct Services {
    pub app: Router,
    pub worker: WatchWorker,
}

pub fn build_services(config: &Config) -> Result<Services, NotifyError> {
    let source = JsonDirCandleSource::new(&config.candles_dir);
    let state = AppState::new(Arc::new(source));
    let notifier = Notifier::from_config(config.telegram.as_ref())?;
    let worker = WatchWorker::new(
        state.clone(),
        notifier,
        config.watchlist.clone(),
        config.poll_interval,
    );

    Ok(Services {
        app: api::app(state),
        worker,
    })
}
