#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use bookstore_tonic_core::proto::{FILE_DESCRIPTOR_SET, bookstore_server::BookstoreServer};
use clap::Parser;
use futures::Stream;
use server::config::{CliArgs, ServerConfig};
use server::service::handler::BookService;
use server::store::{BookStore, mongo::MongoStore};
use server::telemetry::init_telemetry;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::server::Connected;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    tracing::info!("Connecting to MongoDB...");
    let store = MongoStore::connect(&config)
        .await
        .inspect_err(|e| tracing::error!("Error starting MongoDB client: {e:#}"))?;

    let tcp = TcpListener::bind(config.server_addr)
        .await
        .with_context(|| format!("failed to listen on {}", config.server_addr))
        .inspect_err(|e| tracing::error!("{e:#}"))?;
    log_startup_info(&config);

    let service = BookService::new(store);
    let res =
        run_server_with_incoming(service.clone(), TcpListenerStream::new(tcp), shutdown_signal())
            .await;

    tracing::info!("Closing MongoDB...");
    service.shutdown().await;
    tracing::info!("All done!");

    providers.shutdown();
    res
}

/// Serves the `Bookstore` service, gRPC health and reflection on `incoming`
/// until `stop` resolves.
///
/// Once `stop` resolves the health status flips to `NOT_SERVING`, no new
/// connections are accepted and in-flight calls are allowed to finish. The
/// listener is dropped before this returns; the store is left open for the
/// caller to close.
async fn run_server_with_incoming<S, I, IO, IE>(
    service: BookService<S>,
    incoming: I,
    stop: impl Future<Output = ()>,
) -> anyhow::Result<()>
where
    S: BookStore,
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<BookstoreServer<BookService<S>>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let shutdown = async move {
        stop.await;
        tracing::info!("Stopping Bookstore server...");
        health_reporter
            .set_not_serving::<BookstoreServer<BookService<S>>>()
            .await;
    };

    Server::builder()
        .accept_http1(true)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_book_service(service))
        .serve_with_incoming_shutdown(incoming, shutdown)
        .await?;

    tracing::info!("Listener closed");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Bookstore server started on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!("Bookstore server started on {}", config.server_addr);
    }
}

fn build_book_service<S: BookStore>(service: BookService<S>) -> BookstoreServer<BookService<S>> {
    BookstoreServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

/// Resolves on Ctrl+C or SIGTERM. Polled by the server itself, so a failure to
/// install a handler brings the server down instead of going unnoticed.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
