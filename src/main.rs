use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use clap::Parser;
use synack::{Config, LinkType, Listener};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Replay captured frames through the handshake core, one hex-encoded frame per line.
/// Reply frames are written to stdout as hex, ready for injection.
#[derive(Debug, Parser)]
#[command(name = "synack", version)]
struct Args {
    /// Port to accept connections on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// TTL of reply packets
    #[arg(long, default_value_t = 64)]
    ttl: u8,

    /// Window advertised in replies
    #[arg(long, default_value_t = 65535)]
    window: u16,

    /// Most connections tracked at once; SYNs from new endpoints are dropped beyond this
    #[arg(long, default_value_t = 1024)]
    max_connections: usize,

    /// Link-layer framing: ethernet or loopback
    #[arg(short, long, default_value = "ethernet")]
    link: LinkType,

    /// Capture file to replay (stdin if omitted)
    input: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "synack=info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = Config {
        local_port: args.port,
        ttl: args.ttl,
        window: args.window,
        link: args.link,
        max_connections: args.max_connections,
    };

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    info!("Listening on port {} ({})", config.local_port, config.link);
    let mut listener = Listener::new(config);
    let mut stdout = io::stdout().lock();

    for (n, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let frame = match hex::decode(line) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Line {}: not a hex frame: {err}", n + 1);
                continue;
            }
        };

        // Only an entropy failure gets past `handle_frame`; give up on the whole run
        if let Some(reply) = listener.handle_frame(&frame)? {
            writeln!(stdout, "{}", hex::encode(reply))?;
        }
    }

    Ok(())
}
