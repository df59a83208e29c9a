use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{delete, get};
use axum::{Json, Router};
use common::{NewProduct, Product, ServiceHealth, ServiceId};
use tokio::sync::Mutex;
use tracing::info;

mod storage;

use storage::RegistryTable;

#[derive(Clone)]
struct ServerState {
    service_id: ServiceId,
    table: Arc<Mutex<RegistryTable>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .compact()
        .init();

    let state = ServerState {
        service_id: ServiceId::new_v4(),
        table: Arc::new(Mutex::new(
            RegistryTable::init(
                std::env::var("STOCKROOM_DATA_DIR")
                    .unwrap_or_else(|_| "./data/server-node".to_string()),
            )
            .await?,
        )),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/objects", get(list_products).post(create_product))
        .route("/objects/{id}", delete(delete_product))
        .with_state(state);

    let bind_addr = std::env::var("STOCKROOM_SERVER_BIND")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse::<SocketAddr>()?;
    info!(%bind_addr, "registry server listening");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<ServerState>) -> Json<ServiceHealth> {
    Json(ServiceHealth {
        service_id: state.service_id,
        role: "server-node".to_string(),
        online: true,
    })
}

async fn index(State(state): State<ServerState>) -> Html<String> {
    let (data_dir, row_count) = {
        let table = state.table.lock().await;
        (table.root_dir().display().to_string(), table.row_count())
    };

    let body = format!(
        "<!doctype html>
<html lang=\"en\">
<head>
    <meta charset=\"utf-8\" />
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />
    <title>stockroom Registry Server</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 2rem; }}
        main {{ max-width: 760px; margin: 0 auto; }}
        code {{ background: #f4f4f4; padding: 0.2rem 0.4rem; border-radius: 0.2rem; }}
        ul {{ line-height: 1.6; }}
    </style>
</head>
<body>
    <main>
        <h1>stockroom Registry Server</h1>
        <p>Service ID: <code>{}</code></p>
        <p>Registered products: <code>{}</code></p>
        <p>Data directory: <code>{}</code></p>
        <p>This endpoint serves basic server information.</p>
        <h2>Available routes</h2>
        <ul>
            <li><code>GET /</code> — this information page</li>
            <li><code>GET /health</code> — service health JSON</li>
            <li><code>GET /objects</code> — full product list</li>
            <li><code>POST /objects</code> — register a product, returns the record with its assigned id</li>
            <li><code>DELETE /objects/{{id}}</code> — remove a product by id</li>
        </ul>
    </main>
</body>
</html>\n",
        state.service_id, row_count, data_dir,
    );

    Html(body)
}

async fn list_products(State(state): State<ServerState>) -> Json<Vec<Product>> {
    let table = state.table.lock().await;
    Json(table.list())
}

async fn create_product(
    State(state): State<ServerState>,
    Json(payload): Json<NewProduct>,
) -> impl IntoResponse {
    if payload.name.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": "name must not be empty" })),
        )
            .into_response();
    }

    let mut table = state.table.lock().await;
    match table.insert(payload).await {
        Ok(record) => {
            info!(id = %record.id, name = %record.name, "registered product");
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to persist product");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_product(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut table = state.table.lock().await;
    match table.remove(&id).await {
        Ok(true) => {
            info!(id = %id, "deleted product");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            tracing::error!(error = %err, id = %id, "failed to delete product");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
