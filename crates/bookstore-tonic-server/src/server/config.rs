use anyhow::{Context, bail};
use bookstore_tonic_core::record::{COLLECTION_NAME, DATABASE_NAME};
use clap::Parser;
use core::time::Duration;
use std::net::SocketAddr;

/// Runtime configuration for the `bookstore-tonic-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (after
/// an optional `.env` file has been loaded). Only the MongoDB URI is
/// mandatory.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bookstore-tonic-server",
    version,
    about = "A gRPC CRUD service for a book catalog backed by MongoDB"
)]
pub struct CliArgs {
    /// MongoDB connection string.
    ///
    /// Environment variable: `MONGO_IMAGE`
    #[arg(long, env = "MONGO_IMAGE", hide_env_values = true)]
    pub mongo_uri: String,

    /// Database holding the catalog.
    ///
    /// Environment variable: `MONGO_DATABASE`
    #[arg(long, env = "MONGO_DATABASE", default_value_t = String::from(DATABASE_NAME))]
    pub mongo_database: String,

    /// Collection holding the books.
    ///
    /// Environment variable: `MONGO_COLLECTION`
    #[arg(long, env = "MONGO_COLLECTION", default_value_t = String::from(COLLECTION_NAME))]
    pub mongo_collection: String,

    /// Upper bound, in seconds, on dialing MongoDB and on the startup ping.
    ///
    /// Environment variable: `CONNECT_TIMEOUT_SECS`
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// TCP address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:9090"))]
    pub server_addr: String,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_collection: String,
    pub connect_timeout: Duration,
    pub server_addr: SocketAddr,
}

// The URI may embed credentials, keep it out of logs.
impl core::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("mongo_uri", &"<redacted>")
            .field("mongo_database", &self.mongo_database)
            .field("mongo_collection", &self.mongo_collection)
            .field("connect_timeout", &self.connect_timeout)
            .field("server_addr", &self.server_addr)
            .finish()
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.mongo_uri.trim().is_empty() {
            bail!("MONGO_IMAGE must not be empty");
        }

        if args.connect_timeout_secs == 0 {
            bail!("CONNECT_TIMEOUT_SECS must be greater than 0");
        }

        if args.mongo_database.is_empty() || args.mongo_collection.is_empty() {
            bail!("MONGO_DATABASE and MONGO_COLLECTION must not be empty");
        }

        let server_addr = args
            .server_addr
            .parse()
            .with_context(|| format!("invalid SERVER_ADDR `{}`", args.server_addr))?;

        Ok(Self {
            mongo_uri: args.mongo_uri,
            mongo_database: args.mongo_database,
            mongo_collection: args.mongo_collection,
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            server_addr,
        })
    }
}
