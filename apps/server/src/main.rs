//! HTTP server for the BattleScribe data service.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tracing::{error, info};

use bsdata::files::classify;
use bsdata::github::GithubClient;
use bsdata::repo::DataHub;
use bsdata::{Config, Error};

const INDEX_MIME_TYPE: &str = "application/battlescribe.bsi";
const ROSTER_MIME_TYPE: &str = "application/battlescribe.rosz";
const CATALOGUE_MIME_TYPE: &str = "application/battlescribe.catz";
const GAME_SYSTEM_MIME_TYPE: &str = "application/battlescribe.gstz";
const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";
const ATOM_MIME_TYPE: &str = "application/atom+xml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bsdata=debug,server=debug,info".into()),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address.clone();
    let client = Arc::new(GithubClient::new(&config).context("Failed to create GitHub client")?);
    let hub = Arc::new(DataHub::new(config, client));

    let app = Router::new()
        .route("/repos", get(get_repos))
        .route("/repos/feeds/:feed", get(get_feed))
        .route("/repos/:repo_name", get(get_repo))
        .route("/repos/:repo_name/prime", get(prime_repo))
        .route("/repos/:repo_name/:file_name", get(get_file))
        .with_state(hub);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!("Listening on {}", bind_address);
    axum::serve(listener, app)
        .await
        .context("Server terminated")?;
    Ok(())
}

fn error_response(e: Error) -> Response {
    match e {
        Error::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
        e => {
            error!("Request failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn get_repos(State(hub): State<Arc<DataHub>>) -> Response {
    match hub.repository_source().await {
        Ok(source) => Json(source).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_repo(State(hub): State<Arc<DataHub>>, Path(repo_name): Path<String>) -> Response {
    if repo_name.trim().is_empty() {
        return Json(serde_json::json!({
            "errorMessage": "You must provide a repository name."
        }))
        .into_response();
    }
    match hub.repository_files(&repo_name).await {
        Ok(vm) => Json(vm).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_file(
    State(hub): State<Arc<DataHub>>,
    Path((repo_name, file_name)): Path<(String, String)>,
) -> Response {
    match hub.file_data(&repo_name, &file_name).await {
        Ok(bytes) => {
            let headers = [
                (header::CONTENT_TYPE, mime_type(&file_name)),
                (header::CONTENT_DISPOSITION, "attachment"),
            ];
            (headers, bytes).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn get_feed(State(hub): State<Arc<DataHub>>, Path(feed): Path<String>) -> Response {
    let repo_name = feed.trim_end_matches(".atom");
    match hub.release_feed(repo_name).await {
        Ok(xml) => ([(header::CONTENT_TYPE, ATOM_MIME_TYPE)], xml).into_response(),
        Err(e) => error_response(e),
    }
}

async fn prime_repo(State(hub): State<Arc<DataHub>>, Path(repo_name): Path<String>) -> Response {
    match hub.prime_cache(&repo_name).await {
        Ok(()) => format!("Primed cache for {repo_name}.").into_response(),
        Err(e) => error_response(e),
    }
}

fn mime_type(file_name: &str) -> &'static str {
    if classify::is_index_path(file_name) {
        INDEX_MIME_TYPE
    } else if classify::is_roster_path(file_name) {
        ROSTER_MIME_TYPE
    } else if classify::is_catalogue_path(file_name) {
        CATALOGUE_MIME_TYPE
    } else if classify::is_game_system_path(file_name) {
        GAME_SYSTEM_MIME_TYPE
    } else {
        OCTET_STREAM_MIME_TYPE
    }
}
