mod frontend;
mod world;

use std::net::SocketAddr;

use clap::Parser;

use strata::net::UdpTransport;
use strata::simulation::{ClientLoop, ExitReason, LoopConfig, SystemClock};

use frontend::ConsoleFrontend;
use world::ClientWorld;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Strata game client")]
struct Args {
    #[arg(
        short,
        long,
        help = "Server address to connect to (e.g., 127.0.0.1:27100)"
    )]
    server: String,

    #[arg(long, default_value_t = 60, help = "Simulation ticks per second")]
    tick_rate: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let server_addr: SocketAddr = args.server.parse()?;

    log::info!("connecting to {server_addr}");
    let transport = UdpTransport::connect(server_addr)?;
    let frontend = ConsoleFrontend::new()?;

    let config = LoopConfig {
        tick_rate: args.tick_rate,
        ..LoopConfig::default()
    };
    let mut client = ClientLoop::new(
        config,
        ClientWorld::new(),
        transport,
        frontend,
        SystemClock::new(),
    );

    match client.run()? {
        ExitReason::Disconnected => log::info!("server closed the connection"),
        ExitReason::AuthDenied => log::warn!("server refused authentication"),
        ExitReason::CloseRequested => log::info!("closed by user"),
    }

    Ok(())
}
