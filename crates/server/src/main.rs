//! Omnicart Server
//!
//! Axum server exposing the shopping assistant: JSON endpoints to start,
//! stop, and inspect runs, plus WebSocket and SSE feeds of run events.

mod api;

use api::agent::{self as agent_api, agent_routes};
use api::{stream, AppState, SharedState};
use axum::{
    body::Body,
    http::{header, Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use omnicart_core::catalog;
use omnicart_core::models::ModelConfig;
use omnicart_core::swarm::{Session, SessionConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;

#[derive(Parser, Clone)]
#[command(author, version, about = "Omnicart - Multi-domain Shopping Assistant")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Omnicart server (default)
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,
        /// Pause between simulated steps, in milliseconds
        #[arg(long, default_value = "1000")]
        step_delay_ms: u64,
        /// Start with the scripted simulation instead of the agent crew
        #[arg(long)]
        no_crew: bool,
        /// Debug logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Run the assistant on a query (CLI mode, no server)
    Run {
        /// What to shop for
        query: String,
        /// Debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("omnicart_core=info,omnicart_server=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();
}

// === OpenAPI Definition ===

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Omnicart API",
        version = "1.0.0",
        description = "API for the Omnicart multi-domain shopping assistant"
    ),
    paths(
        agent_api::health,
        agent_api::run_agent,
        agent_api::get_status,
        agent_api::get_logs,
        agent_api::get_shopping_list,
        agent_api::stop_agent,
        agent_api::agent_status,
        agent_api::toggle_crew
    ),
    components(
        schemas(
            agent_api::StatusResponse,
            agent_api::RunRequest,
            agent_api::SessionStatus,
            agent_api::AgentRunStatus,
            agent_api::ToggleCrewRequest,
            agent_api::ToggleCrewResponse
        )
    ),
    tags(
        (name = "assistant", description = "Runs, logs, and shopping lists"),
        (name = "agent", description = "Agent lifecycle and mode")
    )
)]
struct ApiDoc;

async fn serve_openapi() -> impl IntoResponse {
    match ApiDoc::openapi().to_json() {
        Ok(spec) => Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(spec))
            .map(IntoResponse::into_response)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(e) => {
            tracing::warn!("Failed to render OpenAPI document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(agent_api::health))
        .route("/api/run", post(agent_api::run_agent))
        .route("/api/status", get(agent_api::get_status))
        .route("/api/logs", get(agent_api::get_logs))
        .route("/api/shopping/list", get(agent_api::get_shopping_list))
        .nest("/api/agent", agent_routes())
        .route("/api/events", get(stream::events))
        .route("/api/ws", get(stream::ws_handler))
        .route("/api/openapi.json", get(serve_openapi))
        .with_state(state)
}

// === Server Entry ===

async fn run_server(host: &str, port: u16, config: SessionConfig) -> anyhow::Result<()> {
    let use_crew = config.use_crew;
    let session = Session::new(config);

    if use_crew {
        let session = session.clone();
        tokio::spawn(async move {
            if let Err(e) = session.start_controller().await {
                tracing::warn!("Failed to start controller: {}", e);
            }
        });
    }

    let state: SharedState = Arc::new(AppState { session });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!(crew_mode = use_crew, "Omnicart Server running at http://{}", addr);
    println!("   Routes:");
    println!("   Assistant: /api/run, /api/status, /api/logs, /api/shopping/list");
    println!("   Agent:     /api/agent/stop, /status, /toggle-crew");
    println!("   Push:      /api/ws (WebSocket), /api/events (SSE)");
    println!("   Docs:      /api/openapi.json");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// One-shot run that prints the log and resulting list
async fn run_cli(query: &str, model: ModelConfig) -> anyhow::Result<()> {
    let session = Session::new(SessionConfig {
        model,
        ..SessionConfig::default()
    });
    session.start_controller().await?;
    session.run(query).await?;

    for entry in session.logs().await {
        println!("[{:?}] {}", entry.level, entry.message);
    }

    let list = session.shopping_list().await;
    println!();
    for item in &list {
        println!(
            "{:>3} {:<8} {:<45} {:>9.2}  @ {}",
            item.quantity,
            item.unit,
            item.name,
            item.price,
            item.store
        );
    }
    println!("Total: {:.2}", catalog::total_cost(&list));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let model = ModelConfig::from_env();

    match args.command {
        Some(CliCommand::Run { query, verbose }) => {
            init_logging(verbose);
            run_cli(&query, model).await
        }
        Some(CliCommand::Serve {
            host,
            port,
            step_delay_ms,
            no_crew,
            verbose,
        }) => {
            init_logging(verbose);
            let config = SessionConfig {
                step_delay: Duration::from_millis(step_delay_ms),
                use_crew: !no_crew,
                model,
                ..SessionConfig::default()
            };
            run_server(&host, port, config).await
        }
        None => {
            init_logging(false);
            run_server(
                "127.0.0.1",
                5000,
                SessionConfig {
                    model,
                    ..SessionConfig::default()
                },
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state(use_crew: bool, step_delay: Duration) -> SharedState {
        Arc::new(AppState {
            session: Session::new(SessionConfig {
                step_delay,
                site_delay: Duration::ZERO,
                use_crew,
                model: ModelConfig::default(),
            }),
        })
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(false, Duration::ZERO));
        let (status, body) = send(&app, get_req("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_initial_agent_status() {
        let app = build_router(test_state(false, Duration::ZERO));
        let (_, body) = send(&app, get_req("/api/agent/status")).await;
        assert_eq!(body["is_running"], false);
        assert_eq!(body["current_task"], "Initializing...");
        assert_eq!(body["agent_status"]["browser"], "idle");
    }

    #[tokio::test]
    async fn test_run_rejects_while_busy() {
        let app = build_router(test_state(false, Duration::from_millis(50)));

        let (status, body) =
            send(&app, post_json("/api/run", serde_json::json!({"query": "eggs"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "started");

        let (status, body) =
            send(&app, post_json("/api/run", serde_json::json!({"query": "milk"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "busy");

        let (_, body) = send(&app, post_json("/api/agent/stop", serde_json::json!({}))).await;
        assert_eq!(body["status"], "stopped");

        let (_, body) = send(&app, get_req("/api/status")).await;
        assert_eq!(body["current_task"], "Stopped by user");
    }

    #[tokio::test]
    async fn test_results_after_run() {
        let state = test_state(false, Duration::ZERO);
        state.session.run("plan a trip to Lisbon").await.unwrap();
        let app = build_router(state);

        let (_, list) = send(&app, get_req("/api/shopping/list")).await;
        assert_eq!(list.as_array().unwrap().len(), 3);
        assert_eq!(list[0]["category"], "hotel");

        let (_, logs) = send(&app, get_req("/api/logs")).await;
        let logs = logs.as_array().unwrap();
        assert_eq!(logs.last().unwrap()["type"], "success");
        assert_eq!(
            logs[0]["message"],
            "Initializing assistant with query: plan a trip to Lisbon"
        );
    }

    #[tokio::test]
    async fn test_toggle_crew() {
        let state = test_state(true, Duration::ZERO);
        let app = build_router(state.clone());

        let (_, body) = send(
            &app,
            post_json("/api/agent/toggle-crew", serde_json::json!({"useCrewAI": false})),
        )
        .await;
        assert_eq!(body, serde_json::json!({"status": "success", "useCrewAI": false}));
        assert!(!state.session.uses_crew());

        let (_, body) =
            send(&app, post_json("/api/agent/toggle-crew", serde_json::json!({}))).await;
        assert_eq!(body["useCrewAI"], true);
        assert!(state.session.uses_crew());
    }

    #[tokio::test]
    async fn test_sse_streams_named_events() {
        use futures::StreamExt;

        let state = test_state(false, Duration::ZERO);
        let app = build_router(state.clone());

        let res = app.oneshot(get_req("/api/events")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        state.session.run("milk").await.unwrap();

        let mut body = res.into_body().into_data_stream();
        let mut text = String::new();
        let read = tokio::time::timeout(Duration::from_secs(5), async {
            while !text.contains("event: current_task\ndata: \"Completed\"") {
                match body.next().await {
                    Some(Ok(chunk)) => text.push_str(&String::from_utf8_lossy(&chunk)),
                    _ => break,
                }
            }
        })
        .await;
        assert!(read.is_ok(), "stream stalled, got: {}", text);

        assert!(text.contains("event: current_task\ndata: \"Processing query: milk\""));
        assert!(text.contains("event: agent_status\ndata: {\"inventory\":\"initializing\""));
        assert!(text.contains("event: agent_log\ndata: {"));
        assert!(text.contains("event: browser_activity\ndata: {\"type\":\"navigation\""));
        assert!(text.contains("event: current_task\ndata: \"Completed\""));
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let app = build_router(test_state(false, Duration::ZERO));
        let (status, body) = send(&app, get_req("/api/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/run"].is_object());
        assert!(body["paths"]["/api/agent/toggle-crew"].is_object());
    }
}
