use axum::{routing::get, Router};
use clap::Parser;
use shared::ProblemId;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use server::auth::JwtGate;
use server::judge::{FixedJudge, Verdict};
use server::problems::InMemoryProblemBank;
use server::room_manager::{AppState, EngineConfig};
use server::ws::ws_handler;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind the WebSocket listener to
    #[clap(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
    /// Secret shared with the identity service for token validation
    #[clap(long)]
    token_secret: String,
    /// Upper bound on a single judging call, in seconds
    #[clap(long, default_value = "30")]
    judge_timeout_secs: u64,
    /// How long finished rooms stay around before being retired, in seconds
    #[clap(long, default_value = "900")]
    retention_secs: u64,
    /// Problem identifiers served by the built-in bank
    #[clap(long = "problem", required = true)]
    problems: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = EngineConfig {
        judge_timeout: Duration::from_secs(args.judge_timeout_secs),
        retention: Duration::from_secs(args.retention_secs),
        ..EngineConfig::default()
    };

    let problems = args.problems.into_iter().map(ProblemId).collect();
    let state = Arc::new(AppState::new(
        Arc::new(JwtGate::new(&args.token_secret)),
        // Placeholder judging backend; deployments wire their execution
        // service here.
        Arc::new(FixedJudge::new(Verdict {
            score: 100,
            passed_test_count: 10,
        })),
        Arc::new(InMemoryProblemBank::new(problems)),
        config,
    ));
    state.clone().spawn_retention_task();

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("listening on {}", args.bind);
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .expect("Failed to bind to address");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
