use std::sync::Arc;

use gamerfie::backend::supabase::SupabaseClient;
use gamerfie::catalog::igdb::IgdbClient;
use gamerfie::config::Config;
use gamerfie::routes;
use gamerfie::state::AppState;
use gamerfie::telemetry::{self, TracingReporter};

fn fail(what: &str, err: &dyn std::fmt::Display) -> ! {
    tracing::error!(error = %err, "{what}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let config = Config::from_env().unwrap_or_else(|e| fail("invalid configuration", &e));

    let supabase =
        Arc::new(SupabaseClient::new(&config.backend, config.http_timeout).unwrap_or_else(|e| fail("backend client", &e)));
    let igdb = IgdbClient::new(&config.catalog, config.http_timeout).unwrap_or_else(|e| fail("catalog client", &e));
    let reporter = TracingReporter::new(&config.telemetry);
    if let Some(sink) = reporter.sink() {
        tracing::info!(sink, "error capture enabled");
    }

    let state = AppState::new(supabase.clone(), supabase, Arc::new(igdb), Arc::new(reporter), config.profile_cache);

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .unwrap_or_else(|e| fail("failed to bind", &e));

    tracing::info!(%port, "gamerfie listening");
    if let Err(e) = axum::serve(listener, app).await {
        fail("server failed", &e);
    }
}
