//! Note canvas server entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Open the note store, serve the remote interface, and close the store on
//!   shutdown.

mod cli;

use clap::Parser;
use cli::Cli;
use log::{error, info, warn};
use notecanvas_core::{init_logging, open_db};
use notecanvas_rpc::{cors_layer, serve, RpcDispatcher};
use std::error::Error;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_config()) {
        eprintln!("notecanvas: continuing without file logs: {err}");
    }

    let db_path = cli.db_path();
    let dispatcher = RpcDispatcher::new(open_db(&db_path)?);
    let cors = cors_layer(&cli.cors_origins)?;
    let listener = TcpListener::bind(cli.bind_addr()).await?;
    info!(
        "event=server_start module=cli status=ok db_path={} cors_origins={}",
        db_path.display(),
        cli.cors_origins.len()
    );

    let served = serve(listener, dispatcher.clone(), cors, shutdown_signal()).await;

    if let Err(err) = dispatcher.close() {
        warn!("event=server_stop module=cli status=error error={err}");
        return Err(err.into());
    }
    served?;
    info!("event=server_stop module=cli status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=server_signal module=cli status=error error={err}");
        std::future::pending::<()>().await;
    }
    info!("event=server_signal module=cli status=ok signal=ctrl_c");
}
