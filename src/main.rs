use onvif_device_rs::http;
use onvif_device_rs::utils::io::Config;
use onvif_device_rs::{DiscoveryResponder, Dispatcher, MulticastTransport};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Parser)]
#[command(name = "onvif-device")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Announce this device over ONVIF WS-Discovery and answer device/media requests")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address advertised to viewers (detected when omitted)
    #[arg(long)]
    ip: Option<Ipv4Addr>,

    /// Port of the ONVIF HTTP service
    #[arg(long)]
    http_port: Option<u16>,

    /// Port of the RTSP server advertised by GetStreamUri
    #[arg(long)]
    rtsp_port: Option<u16>,

    /// Multicast Hello while discoverable
    #[arg(long)]
    hello: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(ip) = cli.ip {
        config.network.ip = Some(ip);
    }
    if let Some(port) = cli.http_port {
        config.network.http_port = port;
    }
    if let Some(port) = cli.rtsp_port {
        config.network.rtsp_port = port;
    }
    config.discovery.hello |= cli.hello;

    let context = Arc::new(config.device_context()?);
    info!(
        "[Main] {} {} at {}",
        context.identity.manufacturer, context.identity.model, context.endpoint.ip
    );

    let transport = match MulticastTransport::open() {
        Ok(transport) => transport,
        Err(e) => {
            error!("[Main] Discovery unavailable: {e}");
            return Err(e.into());
        }
    };
    let mut responder =
        DiscoveryResponder::spawn(transport, context.clone(), config.responder_options());

    let http_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, context.endpoint.http_port);
    let listener = TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("[Main] Unable to bind HTTP on {http_addr}"))?;

    let (stop_http, http_stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(http::serve(
        listener,
        Dispatcher::new(context.clone()),
        async move {
            let _ = http_stopped.await;
        },
    ));

    tokio::signal::ctrl_c()
        .await
        .context("[Main] Unable to listen for Ctrl-C")?;
    info!("[Main] Shutting down");

    responder.stop().await;

    let _ = stop_http.send(());
    server.await??;

    Ok(())
}
