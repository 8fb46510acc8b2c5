//! webfn command line.
//!
//! # Commands
//! - `serve`: run the demo route table behind the HTTP server
//! - `routes`: print the demo route table's documentation and attributes
//! - `send`: build a `ClientRequest` from arguments and exchange it

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use webfn::config::{load_config, AppConfig};
use webfn::http::{ClientRequest, ExchangeFunction, HttpServer};
use webfn::observability::{logging, metrics};
use webfn::routing::{
    handler_fn, AttributesVisitor, OperationRouteBuilder, PathVariables, RouteDocs, RouterFunction,
};

#[derive(Parser)]
#[command(name = "webfn")]
#[command(about = "Functional HTTP routing and request building", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo routes
    Serve,
    /// Print documentation for the demo routes
    Routes,
    /// Send a single request and print the response
    Send {
        /// HTTP method
        method: String,
        /// Absolute URL
        url: String,
        /// Header as `name:value`, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Cookie as `name=value`, repeatable
        #[arg(long = "cookie")]
        cookies: Vec<String>,
        /// JSON body
        #[arg(long)]
        json: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability.log_filter);
    tracing::info!("webfn v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Routes => print_routes(),
        Commands::Send {
            method,
            url,
            headers,
            cookies,
            json,
        } => send(&config, &method, &url, &headers, &cookies, json.as_deref()).await,
    }
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        docs_enabled = config.docs.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(demo_routes(), config).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_routes() -> Result<(), Box<dyn std::error::Error>> {
    let routes = demo_routes();

    let mut visitor = AttributesVisitor::new();
    routes.accept(&mut visitor);
    for report in visitor.reports() {
        println!("{} {:?}", report.route, report.attributes.names());
    }

    println!("{}", serde_json::to_string_pretty(&RouteDocs::collect(&routes))?);
    Ok(())
}

async fn send(
    config: &AppConfig,
    method: &str,
    url: &str,
    headers: &[String],
    cookies: &[String],
    json: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
    let mut builder = ClientRequest::create(method, url)?;

    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("Header must be name:value, got {}", header))?;
        builder = builder.header(name.trim(), [value.trim()]);
    }
    for cookie in cookies {
        let (name, value) = cookie
            .split_once('=')
            .ok_or_else(|| format!("Cookie must be name=value, got {}", cookie))?;
        builder = builder.cookie(name.trim(), value.trim());
    }
    if let Some(json) = json {
        let value: serde_json::Value = serde_json::from_str(json)?;
        builder = builder.body_value(value);
    }

    let exchange = ExchangeFunction::new(&config.client)?;
    let response = exchange.exchange(&builder.build()).await?;

    println!("{}", response.status());
    for (name, value) in response.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    println!();
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}

fn demo_routes() -> RouterFunction {
    OperationRouteBuilder::route()
        .get(
            "/items/{id}",
            handler_fn(|req: Request<Body>| async move {
                let id = req
                    .extensions()
                    .get::<PathVariables>()
                    .and_then(|vars| vars.get("id"))
                    .unwrap_or_default()
                    .to_string();
                axum::Json(serde_json::json!({ "id": id }))
            }),
            |ops| {
                ops.parameter("id", "Item identifier")
                    .response(200, "The item")
                    .response(404, "No such item");
            },
        )
        .with(|routes| {
            routes
                .get("/hello", handler_fn(|_req: Request<Body>| async { "Hello, world!" }))
                .post(
                    "/echo",
                    handler_fn(|req: Request<Body>| async move { req.into_body() }),
                )
        })
        .build()
}
