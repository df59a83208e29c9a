use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{delete, get};
use axum::{Json, Router};
use clap::{Parser, Subcommand};
use client_sdk::RegistryClient;
use common::Product;
use registry_core::FormInput;
use reqwest::Client;
use serde::Deserialize;
use tracing::error;

#[derive(Clone)]
struct WebState {
    server_url: String,
    http: Client,
    client: RegistryClient,
}

#[derive(Debug, Parser)]
#[command(name = "stockroom")]
#[command(about = "CLI client for the stockroom product registry")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long)]
    cache_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Register {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        memory: String,
        #[arg(long, default_value = "")]
        storage: String,
        #[arg(long, default_value = "")]
        color: String,
        #[arg(long, default_value = "")]
        price: String,
    },
    List,
    Delete {
        id: String,
    },
    Total,
    Health,
    ServeWeb {
        #[arg(long, default_value = "127.0.0.1:8081")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut client = RegistryClient::new(&cli.server_url);
    if let Some(path) = &cli.cache_file {
        client = client.with_cache_file(path);
    }
    let http = Client::new();

    match cli.command {
        Commands::Register {
            name,
            memory,
            storage,
            color,
            price,
        } => {
            let input = FormInput {
                name,
                memory,
                storage,
                color,
                price,
            };
            // Validate before hydration so a rejected submit never issues
            // any request at all.
            input.validate()?;

            client.hydrate().await?;
            let record = client.register(input).await?;
            println!("registered '{}' (id {})", record.name, record.id);
        }
        Commands::List => {
            client.hydrate().await?;
            let products = client.products().await;
            for product in &products {
                print_product(product);
            }
            println!("total products: {}", products.len());
        }
        Commands::Delete { id } => {
            client.hydrate().await?;
            client.delete(&id).await?;
            println!("deleted {id}");
        }
        Commands::Total => {
            client.hydrate().await?;
            println!("{}", client.total().await);
        }
        Commands::Health => {
            print_json_endpoint(&http, &cli.server_url, "/health").await?;
        }
        Commands::ServeWeb { bind } => {
            tracing_subscriber::fmt()
                .with_env_filter("info")
                .with_target(false)
                .compact()
                .init();

            let bind_addr: SocketAddr = bind.parse()?;

            // The form session starts empty when neither the cache file nor
            // the server is reachable; the page itself still loads.
            if let Err(err) = client.hydrate().await {
                tracing::warn!(error = %err, "initial hydration failed");
            }

            let state = WebState {
                server_url: cli.server_url.clone(),
                http,
                client,
            };

            let app = Router::new()
                .route("/", get(|| async { Html(web_ui::app_html()) }))
                .route("/api/health", get(web_health))
                .route(
                    "/api/products",
                    get(web_products_list).post(web_products_register),
                )
                .route("/api/products/{id}", delete(web_products_delete))
                .route(
                    "/api/ping",
                    get(|| async {
                        Json(serde_json::json!({
                            "ok": true,
                            "service": "cli-client-web"
                        }))
                    }),
                )
                .with_state(state);

            println!("web interface at http://{bind_addr}");
            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn print_product(product: &Product) {
    println!("{} (id {})", product.name, product.id);
    if let Some(details) = &product.details {
        for (key, value) in &details.attributes {
            println!("  {key}: {value}");
        }
        if let Some(price) = details.price {
            println!("  price: {price}");
        }
    }
}

async fn print_json_endpoint(http: &Client, server_url: &str, path: &str) -> Result<()> {
    let value = fetch_server_json(http, server_url, path).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn fetch_server_json(
    http: &Client,
    server_url: &str,
    path: &str,
) -> Result<serde_json::Value> {
    let url = format!("{}{}", server_url.trim_end_matches('/'), path);
    let value = http
        .get(url)
        .send()
        .await
        .context("failed to contact server")?
        .error_for_status()
        .context("server returned error status")?
        .json::<serde_json::Value>()
        .await
        .context("failed to decode server response")?;
    Ok(value)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WebRegisterRequest {
    name: String,
    memory: String,
    storage: String,
    color: String,
    price: String,
}

async fn web_health(State(state): State<WebState>) -> impl IntoResponse {
    match fetch_server_json(&state.http, &state.server_url, "/health").await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => error_response(StatusCode::BAD_GATEWAY, err.to_string()),
    }
}

async fn web_products_list(State(state): State<WebState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.client.products().await)).into_response()
}

async fn web_products_register(
    State(state): State<WebState>,
    Json(payload): Json<WebRegisterRequest>,
) -> impl IntoResponse {
    let input = FormInput {
        name: payload.name,
        memory: payload.memory,
        storage: payload.storage,
        color: payload.color,
        price: payload.price,
    };

    // Validation failures never reach the server.
    if let Err(err) = input.validate() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string());
    }

    match state.client.register(input).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => {
            error!(error = %err, "product registration failed");
            error_response(StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}

async fn web_products_delete(
    State(state): State<WebState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.client.delete(&id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!(error = %err, id = %id, "product delete failed");
            error_response(StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}
