//! Loop lifecycle.
//!
//! Owns the named join handles for the polling loops and the shutdown
//! channel they watch. Shutdown is cooperative: loops finish their
//! current iteration and exit, and any result resolving after the
//! loops stop is simply dropped.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use vatmap_feed::FeedClient;

use crate::config::Config;
use crate::loops::{run_detail_loop, run_entity_loop, run_fir_loop, run_weather_loop};
use crate::renderer::SharedRenderer;
use crate::state::AppState;

pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Spawn all polling loops against a shared state and renderer.
    pub fn start(
        config: &Config,
        state: Arc<AppState>,
        renderer: SharedRenderer,
        client: Arc<FeedClient>,
    ) -> Self {
        let mut scheduler = Self::new();
        scheduler.spawn(
            "entity",
            run_entity_loop(
                Arc::clone(&state),
                Arc::clone(&renderer),
                Arc::clone(&client),
                config.entity_poll,
                scheduler.subscribe(),
            ),
        );
        scheduler.spawn(
            "fir",
            run_fir_loop(
                Arc::clone(&state),
                Arc::clone(&renderer),
                Arc::clone(&client),
                config.fir_poll,
                scheduler.subscribe(),
            ),
        );
        scheduler.spawn(
            "weather",
            run_weather_loop(
                Arc::clone(&state),
                Arc::clone(&renderer),
                Arc::clone(&client),
                config.weather_poll,
                scheduler.subscribe(),
            ),
        );
        // Detail refresh rides the entity cadence.
        scheduler.spawn(
            "detail",
            run_detail_loop(state, renderer, client, config.entity_poll, scheduler.subscribe()),
        );
        scheduler
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn spawn(&mut self, name: &'static str, task: impl Future<Output = ()> + Send + 'static) {
        tracing::debug!(name, "loop spawned");
        self.tasks.push((name, tokio::spawn(task)));
    }

    /// Signal every loop to stop and wait for them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for (name, handle) in self.tasks {
            if let Err(err) = handle.await {
                tracing::warn!(name, error = %err, "loop ended abnormally");
            }
        }
        tracing::info!("all loops stopped");
    }
}
