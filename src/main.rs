//! Binary entry point for the vSphere power bridge.

use std::io::{self, Write};
use std::net::{Ipv4Addr, SocketAddr};
use std::process;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use vsphere_bridge::{
    ApiError, BridgeConfig, ConfigError, ConfigOverrides, ErrorChain, HttpTransport, Notifier,
    PowerExecutor, VsphereClient, init_tracing, logging, router,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("unable to build http client: {0}")]
    Transport(#[from] ApiError),
    #[error("{}", .0.short_message())]
    Client(ErrorChain),
    #[error("unable to listen on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("server terminated: {0}")]
    Serve(#[source] io::Error),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match serve(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn serve(cli: Cli) -> Result<(), CliError> {
    let config = BridgeConfig::load_without_cli_args()?.with_overrides(overrides(cli));
    config.validate()?;
    init_tracing(config.log_settings()?);

    let transport = Arc::new(HttpTransport::new(config.insecure, config.timeout())?);
    let client =
        VsphereClient::from_config(&config, transport.clone()).map_err(CliError::Client)?;
    let notifier = Notifier::new(config.notify_urls(), transport);
    let executor = PowerExecutor::new(client, notifier);

    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| CliError::Bind {
            port: config.port,
            source,
        })?;

    info!(%address, upstream = %config.fqdn, "bridge listening");
    axum::serve(listener, router(executor))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(CliError::Serve)
}

fn overrides(cli: Cli) -> ConfigOverrides {
    ConfigOverrides {
        fqdn: cli.fqdn,
        insecure: cli.insecure,
        port: cli.port,
        notify_url: cli.notify_url,
        log_level: cli.log_level,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        logging::error(&ErrorChain::wrap(err, "unable to listen for shutdown signal"));
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_carry_every_flag() {
        let cli = Cli::parse_from([
            "vsphere-bridge",
            "--fqdn",
            "https://vsphere.local",
            "--insecure",
            "--port",
            "9000",
            "--notify-url",
            "https://hooks.example/a",
            "--log-level",
            "debug",
        ]);

        let overrides = overrides(cli);

        assert_eq!(overrides.fqdn.as_deref(), Some("https://vsphere.local"));
        assert!(overrides.insecure);
        assert_eq!(overrides.port, Some(9000));
        assert_eq!(
            overrides.notify_url.as_deref(),
            Some("https://hooks.example/a")
        );
        assert_eq!(overrides.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn no_flags_means_no_overrides() {
        let cli = Cli::parse_from(["vsphere-bridge"]);
        assert_eq!(overrides(cli), ConfigOverrides::default());
    }

    #[test]
    fn write_error_includes_the_actionable_hint() {
        let mut buf = Vec::new();
        let err = CliError::Config(ConfigError::MissingField(String::from(
            "missing vSphere FQDN: set VSPHERE_FQDN or pass --fqdn",
        )));
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(rendered.contains("VSPHERE_FQDN"), "rendered: {rendered}");
    }
}
