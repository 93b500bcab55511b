use crate::bridge::model::StatusModel;
use anyhow::{anyhow, Context, Result};
use curbcore::session::SessionCommand;
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use warp::{http::StatusCode, Filter};

/// HTTP bridge: serves the latest status and queues operator commands for
/// the frame loop. Replaces mouse-driven zone and line editing.
pub struct Bridge {
    state: Arc<RwLock<StatusModel>>,
    commands: UnboundedSender<SessionCommand>,
}

impl Bridge {
    pub fn new() -> (Self, UnboundedReceiver<SessionCommand>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let bridge = Self {
            state: Arc::new(RwLock::new(StatusModel::default())),
            commands,
        };
        (bridge, receiver)
    }

    fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());
        let commands = self.commands.clone();
        let command_filter = warp::any().map(move || commands.clone());

        let status_route = warp::path("status")
            .and(warp::get())
            .and(state_filter)
            .map(|state: Arc<RwLock<StatusModel>>| {
                let model = state
                    .read()
                    .map(|guard| guard.clone())
                    .unwrap_or_default();
                warp::reply::json(&model)
            });

        let command_route = warp::path("command")
            .and(warp::post())
            .and(warp::body::json())
            .and(command_filter)
            .map(
                |command: SessionCommand, commands: UnboundedSender<SessionCommand>| {
                    info!("bridge queued {:?}", command);
                    match commands.send(command) {
                        Ok(()) => warp::reply::with_status(
                            warp::reply::json(&json!({"status": "queued"})),
                            StatusCode::ACCEPTED,
                        ),
                        Err(_) => warp::reply::with_status(
                            warp::reply::json(&json!({"status": "monitor stopped"})),
                            StatusCode::SERVICE_UNAVAILABLE,
                        ),
                    }
                },
            );

        status_route.or(command_route)
    }

    /// Serves the bridge on its own thread and runtime.
    pub fn serve(&self, addr: SocketAddr) -> Result<()> {
        let routes = self.routes();
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building bridge runtime")?;
        thread::Builder::new()
            .name("bridge".into())
            .spawn(move || {
                runtime.block_on(async move {
                    warp::serve(routes).run(addr).await;
                });
                error!("bridge on {} stopped", addr);
            })
            .context("spawning bridge thread")?;
        info!("bridge listening on http://{}", addr);
        Ok(())
    }

    pub fn publish(&self, model: &StatusModel) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("bridge state lock poisoned"))?;
        *guard = model.clone();
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> StatusModel {
        self.state.read().unwrap().clone()
    }
}
