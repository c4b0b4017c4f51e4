//! Command-line configuration for the service binary.
//!
//! Scope is intentionally narrow: everything the binary needs to bind a
//! socket and reach the cluster API. There is no layered file/env
//! configuration system here — a receiver fleet's actual behavior lives in
//! the `Receiver` objects themselves, not in this process's flags.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "notif-receiver-service", about = "Webhook receiver for declaratively-configured Receivers")]
pub struct ServiceConfig {
    /// Address and port to bind the HTTP listener to.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: std::net::SocketAddr,

    /// API group the Receiver custom resource is served under.
    #[arg(long, env = "RECEIVER_GROUP", default_value = "notification.toolkit.fluxcd.io")]
    pub receiver_group: String,

    /// API version the Receiver custom resource is served under.
    #[arg(long, env = "RECEIVER_VERSION", default_value = "v1")]
    pub receiver_version: String,

    /// Plural resource name used in the Receiver's API path.
    #[arg(long, env = "RECEIVER_PLURAL", default_value = "receivers")]
    pub receiver_plural: String,

    /// Log output format: "pretty" for local development, "json" for production.
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}
