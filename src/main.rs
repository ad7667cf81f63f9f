use std::sync::Arc;

use delve_ai::config::Config;
use delve_ai::engine::manager::AiManager;
use delve_ai::engine::server::{register_rooms, TickServer};
use delve_ai::metrics;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    metrics::register_metrics();

    let config = Config::load();
    tracing::info!(?config, "Starting creature AI");

    let manager = Arc::new(AiManager::new(config.seed, config.combat));
    manager.on_teardown(|room| tracing::info!(room, "Room released"));

    // The world layer would hold these handles; here they just stay alive
    let _rooms = match register_rooms(&manager, &config.rooms_dir) {
        Ok(rooms) => rooms,
        Err(e) => {
            tracing::error!(dir = %config.rooms_dir.display(), "Failed to load rooms: {e}");
            std::process::exit(1);
        }
    };

    let server = Arc::new(TickServer::new(
        Arc::clone(&manager),
        config.tick_interval,
        config.max_ticks,
    ));

    // Log every published update
    let mut rx = server.subscribe();
    tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            tracing::debug!("{msg}");
        }
    });

    let loop_server = Arc::clone(&server);
    let tick_loop = tokio::spawn(async move { loop_server.run().await });

    tokio::select! {
        _ = tick_loop => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            server.stop();
        }
    }

    for room in manager.room_names() {
        manager.remove_room(&room);
    }
    tracing::info!("{}", metrics::gather_metrics());
}
