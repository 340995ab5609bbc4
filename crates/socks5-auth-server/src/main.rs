#[macro_use]
extern crate tracing;

mod config;

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use socks_auth::{Authenticator, CredentialStore, client_handshake, server_handshake};
use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument as _;
use tracing_subscriber::EnvFilter;

use crate::config::{USAGE, load_users_file, parse_args};

/// Upstream SOCKS5 proxy the authenticated streams are handed to.
#[derive(Debug)]
struct Upstream {
    addr: String,
    auth: Authenticator,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let args: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();
    let mut args = parse_args(&args)?;

    if args.show_usage {
        let prgm_name = env::args().next().unwrap_or_else(|| "socks5-auth-server".to_owned());
        #[allow(clippy::print_stdout)]
        {
            println!("Usage: {prgm_name} {USAGE}");
        }
        return Ok(());
    }

    setup_logger(args.log_filter)?;

    if let Some(path) = args.users_file {
        let users = load_users_file(Path::new(path)).await?;
        args.users.extend(users);
    }

    let auth = Arc::new(Authenticator::new(CredentialStore::new(args.users)));

    let upstream = args.upstream.map(|addr| {
        Arc::new(Upstream {
            addr: addr.to_owned(),
            auth: Authenticator::new(args.upstream_user.into_iter().collect::<CredentialStore>()),
        })
    });

    if auth.credentials().is_empty() {
        warn!("No user configured, authentication is not enforced");
    }

    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("failed to bind listener on port {}", args.port))?;

    info!(
        port = args.port,
        users = auth.credentials().len(),
        upstream = upstream.as_ref().map(|upstream| upstream.addr.as_str()),
        "Listening for SOCKS5 streams"
    );

    loop {
        let (socket, addr) = listener.accept().await.context("failed to accept connection")?;

        let auth = Arc::clone(&auth);
        let upstream = upstream.clone();

        tokio::spawn(
            async move {
                match process_socket(socket, &auth, upstream.as_deref()).await {
                    Ok(()) => debug!("Stream processed successfully"),
                    Err(e) => debug!("Stream processing failed: {:#}", e),
                }
            }
            .instrument(info_span!("process", %addr)),
        );
    }
}

fn setup_logger(log_filter: &str) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::try_new(log_filter).context("invalid log filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to set up logger")
}

async fn process_socket(incoming: TcpStream, auth: &Authenticator, upstream: Option<&Upstream>) -> anyhow::Result<()> {
    let mut incoming = server_handshake(auth, incoming)
        .await
        .context("SOCKS5 authentication")?;

    info!("Client authenticated");

    let Some(upstream) = upstream else {
        return Ok(());
    };

    let target = TcpStream::connect(&upstream.addr)
        .await
        .with_context(|| format!("failed to connect to upstream proxy at {}", upstream.addr))?;

    let mut target = client_handshake(&upstream.auth, target)
        .await
        .context("upstream SOCKS5 authentication")?;

    debug!(upstream = %upstream.addr, "Relaying to upstream proxy");

    let (to_upstream, to_client) = tokio::io::copy_bidirectional(&mut incoming, &mut target)
        .await
        .context("relay")?;

    debug!(to_upstream, to_client, "Relay ended");

    Ok(())
}
