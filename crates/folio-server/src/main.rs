use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use folio_server::{FolioServer, ServerConfig};

/// Namespace-partitioned JSON document store over HTTP.
#[derive(Parser)]
#[command(name = "folio-server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:5990")]
    addr: SocketAddr,

    /// Directory namespace files live under.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let config = ServerConfig {
        bind_addr: args.addr,
        data_dir: args.data_dir,
    };
    FolioServer::new(config).serve().await?;
    Ok(())
}
