//! Serve `demos/minimal/serverless.yml` with handlers written in Rust.
//!
//! ```text
//! cargo run --example minimal
//! curl http://localhost:8180/minimal/route
//! curl -X POST -H 'content-type: application/json' -d '{"prop":"value"}' http://localhost:8180/minimal/route
//! curl http://localhost:8180/echo/any/thing?x=1
//! ```

use serde_json::{json, Value};
use tokio::net::TcpListener;

use lambda_local::handlers::{echo, HandlerRegistry, HandlerResult};
use lambda_local::lifecycle::signals::spawn_signal_handler;
use lambda_local::observability::init_logging;
use lambda_local::{EmulatorConfig, EmulatorServer, ProxyEvent, ProxyResponse, Shutdown};

async fn get_handler(event: ProxyEvent) -> HandlerResult {
    let response = ProxyResponse::new(200).with_header("Content-Type", "application/json");
    if event.http_method == "GET" {
        Ok(response.with_body(json!({ "text": "JSON response" })))
    } else {
        Ok(response)
    }
}

async fn post_handler(event: ProxyEvent) -> HandlerResult {
    let body: Value = event.json_body()?;
    Ok(ProxyResponse::default().with_body(json!({ "postBody": body })))
}

async fn delete_handler(_event: ProxyEvent) -> HandlerResult {
    Ok(ProxyResponse::new(204))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = EmulatorConfig::default();
    config.services.push("demos/minimal/serverless.yml".into());
    init_logging(&config.observability)?;

    let mut registry = HandlerRegistry::new();
    registry
        .register("handlers", "getHandler", get_handler)
        .register("handlers", "postHandler", post_handler)
        .register("handlers", "putHandler", post_handler)
        .register("handlers", "deleteHandler", delete_handler);
    echo::register(&mut registry);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!("Listening at http://{}", listener.local_addr()?);

    let server = EmulatorServer::new(config, &registry)?;
    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
