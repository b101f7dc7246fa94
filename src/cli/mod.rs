//! Command-line interface definitions for the `vsphere-bridge` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `vsphere-bridge` binary.
///
/// Every flag is optional; configuration files and `VSPHERE_*` environment
/// variables supply anything not given here.
#[derive(Debug, Parser)]
#[command(
    name = "vsphere-bridge",
    about = "Serve single-call HTTP endpoints for vSphere virtual machine power actions",
    after_help = concat!(
        "Environment:\n",
        "  VSPHERE_FQDN          vSphere base URL (required)\n",
        "  VSPHERE_USERNAME      API username\n",
        "  VSPHERE_PASSWORD      API password\n",
        "  VSPHERE_AUTHORIZATION pre-computed Authorization header\n",
        "  VSPHERE_INSECURE      skip TLS certificate validation\n",
        "  VSPHERE_PORT          listening port (default 8000)\n",
        "  VSPHERE_NOTIFY_URL    comma separated webhook URLs",
    )
)]
pub(crate) struct Cli {
    /// Base URL of the vSphere instance, for example `https://vsphere.local`.
    #[arg(long, value_name = "URL")]
    pub(crate) fqdn: Option<String>,
    /// Skip TLS certificate validation when talking to vSphere.
    #[arg(long)]
    pub(crate) insecure: bool,
    /// Port to listen on.
    #[arg(long, value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// Comma separated webhook URLs notified after power changes.
    #[arg(long, value_name = "URLS")]
    pub(crate) notify_url: Option<String>,
    /// Minimum log level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub(crate) log_level: Option<String>,
}
