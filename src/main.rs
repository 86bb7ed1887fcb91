mod assessment;
mod config;
mod corpus;
mod embedder;
mod error;
mod knowledge;
mod progress;

use crate::assessment::{Assessor, OpenAiAssessor, TieredAssessor};
use crate::config::{EmbedderKind, Settings};
use crate::embedder::{Embedder, HashEmbedder, OpenAiEmbedder};
use crate::error::QueryError;
use crate::knowledge::engine::QueryEngine;
use crate::knowledge::index::{CorpusIndex, SharedIndex};
use crate::progress::{Progress, ProgressReporter};
use anyhow::Result;
use async_openai::Client;
use dotenv::dotenv;
use env_logger::Builder;
use futures::{SinkExt, StreamExt};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use warp::http::StatusCode;
use warp::ws::{Message, WebSocket};
use warp::{Filter, Rejection, Reply};

#[macro_use]
extern crate log;

/// Upper bound on a query request body.
const MAX_BODY_BYTES: u64 = 16 * 1024;

#[derive(Deserialize, Serialize)]
struct QueryRequest {
    text: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // read .env
    dotenv().ok();

    // init logger
    let log_level = std::env::var("RUST_LOG").unwrap_or_default();

    if log_level == "debug" {
        Builder::new()
            .filter(None, LevelFilter::Off)
            .filter(Some("pitchmap"), LevelFilter::Debug)
            .init();
    } else if log_level == "info" {
        Builder::new()
            .filter(None, LevelFilter::Off)
            .filter(Some("pitchmap"), LevelFilter::Info)
            .init();
    } else {
        env_logger::init();
    }

    let settings = Settings::from_env()?;
    info!("settings: {:?}", settings);

    let embedder: Arc<dyn Embedder> = match settings.embedder {
        EmbedderKind::Local => Arc::new(HashEmbedder::new(settings.local_embedding_dim)),
        EmbedderKind::OpenAi => Arc::new(OpenAiEmbedder::new(
            Client::new(),
            settings.embedding_model.clone(),
        )),
    };
    let primary: Option<Box<dyn Assessor>> = if settings.remote_assessment {
        Some(Box::new(OpenAiAssessor::new(
            Client::new(),
            settings.chat_model.clone(),
        )))
    } else {
        None
    };
    let assessor = Arc::new(TieredAssessor::new(primary));

    let shared = SharedIndex::new();
    let (reporter, progress_rx) = ProgressReporter::channel();
    let engine = QueryEngine::new(shared.clone(), Arc::clone(&embedder), assessor);

    let ingest_embedder = Arc::clone(&embedder);
    let corpus_path = settings.corpus_path.clone();
    tokio::spawn(async move {
        ingest(ingest_embedder, corpus_path, shared, reporter).await;
    });

    info!("server running at port: {}", settings.port);
    warp::serve(routes(engine, progress_rx))
        .run(([0, 0, 0, 0], settings.port))
        .await;

    Ok(())
}

async fn ingest(
    embedder: Arc<dyn Embedder>,
    corpus_path: Option<std::path::PathBuf>,
    shared: SharedIndex,
    reporter: ProgressReporter,
) {
    info!("ingestion start with embedder {}", embedder.name());
    if let Err(e) = embedder.warm_up(&reporter).await {
        // entries will fail one by one and be skipped
        error!("embedder warm up failed: {}", e);
    }
    reporter.loading(1.0);

    let source = corpus::load(corpus_path.as_deref()).await;
    info!("ingesting {} texts from {:?} source", source.texts.len(), source.origin);
    let index = CorpusIndex::build(source.texts, embedder.as_ref(), &reporter).await;
    let (entries, skipped) = (index.len(), index.skipped());
    if index.dropped() > 0 {
        info!("{} texts were too short to index", index.dropped());
    }

    match shared.publish(index) {
        Ok(()) => {
            reporter.report(Progress::Ready { entries, skipped });
            info!("index ready: {} entries, {} skipped", entries, skipped);
        }
        Err(e) => error!("publish index failed: {}", e),
    }
}

fn routes(
    engine: QueryEngine,
    progress_rx: watch::Receiver<Progress>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let query_route = warp::path("query")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<QueryRequest>())
        .and(warp::any().map(move || engine.clone()))
        .and_then(handle_query);

    let status_rx = progress_rx.clone();
    let status_route = warp::path("status")
        .and(warp::get())
        .and(warp::any().map(move || status_rx.clone()))
        .and_then(handle_status);

    let progress_route = warp::path("ws")
        .and(warp::ws())
        .and(warp::any().map(move || progress_rx.clone()))
        .map(|ws: warp::ws::Ws, rx: watch::Receiver<Progress>| {
            ws.on_upgrade(move |socket| handle_progress(rx, socket))
        });

    query_route.or(status_route).or(progress_route)
}

async fn handle_query(
    request: QueryRequest,
    engine: QueryEngine,
) -> Result<warp::reply::Response, Rejection> {
    info!("get query request: {:?}", request.text);

    let reply = match engine.query(&request.text).await {
        Ok(result) => warp::reply::with_status(warp::reply::json(&result), StatusCode::OK)
            .into_response(),
        Err(e) => {
            warn!("handle query request failed: {}", e);
            let status = match e {
                QueryError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                QueryError::IndexNotReady => StatusCode::SERVICE_UNAVAILABLE,
                QueryError::EmbeddingFailure(_) => StatusCode::BAD_GATEWAY,
            };
            let body = ErrorBody {
                error: e.kind(),
                message: e.to_string(),
            };
            warp::reply::with_status(warp::reply::json(&body), status).into_response()
        }
    };
    Ok(reply)
}

async fn handle_status(progress_rx: watch::Receiver<Progress>) -> Result<impl Reply, Rejection> {
    let snapshot = progress_rx.borrow().clone();
    Ok(warp::reply::json(&snapshot))
}

async fn handle_progress(mut progress_rx: watch::Receiver<Progress>, ws: WebSocket) {
    let (mut tx, _) = ws.split();

    loop {
        let snapshot = progress_rx.borrow_and_update().clone();
        let ready = snapshot.is_ready();
        let text = match serde_json::to_string(&snapshot) {
            Ok(text) => text,
            Err(e) => {
                warn!("encode progress failed: {}", e);
                break;
            }
        };
        if let Err(e) = tx.send(Message::text(text)).await {
            debug!("progress subscriber went away: {}", e);
            return;
        }
        if ready || progress_rx.changed().await.is_err() {
            break;
        }
    }
    let _ = tx.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn ready_engine() -> QueryEngine {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let (reporter, _rx) = ProgressReporter::channel();
        let index = CorpusIndex::build(
            vec![
                "Uber for dog walking".to_string(),
                "Airbnb for photography studios".to_string(),
            ],
            embedder.as_ref(),
            &reporter,
        )
        .await;
        QueryEngine::new(
            SharedIndex::ready(index),
            embedder,
            Arc::new(TieredAssessor::local_only()),
        )
    }

    fn idle_progress() -> watch::Receiver<Progress> {
        let (_reporter, rx) = ProgressReporter::channel();
        rx
    }

    #[tokio::test]
    async fn query_returns_result_json() {
        let api = routes(ready_engine().await, idle_progress());

        let res = warp::test::request()
            .method("POST")
            .path("/query")
            .json(&QueryRequest {
                text: "A ride-sharing app for walking dogs in cities".into(),
            })
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["bestSimilarity"].as_f64().unwrap() > 0.4);
        assert!(body["noveltyScore"].as_u64().unwrap() <= 6);
        assert!(body["position"]["x"].is_number());
        assert!(body["title"].is_string());
    }

    #[tokio::test]
    async fn short_query_is_bad_request() {
        let api = routes(ready_engine().await, idle_progress());

        let res = warp::test::request()
            .method("POST")
            .path("/query")
            .json(&QueryRequest {
                text: "too short".into(),
            })
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "InvalidInput");
    }

    #[tokio::test]
    async fn query_before_ready_is_unavailable() {
        let engine = QueryEngine::new(
            SharedIndex::new(),
            Arc::new(HashEmbedder::default()),
            Arc::new(TieredAssessor::local_only()),
        );
        let api = routes(engine, idle_progress());

        let res = warp::test::request()
            .method("POST")
            .path("/query")
            .json(&QueryRequest {
                text: "Peer-to-peer rentals of camping gear".into(),
            })
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "IndexNotReady");
    }

    #[tokio::test]
    async fn status_reports_progress() {
        let (reporter, rx) = ProgressReporter::channel();
        reporter.report(Progress::Ingesting {
            attempted: 3,
            total: 10,
            skipped: 1,
        });
        let api = routes(ready_engine().await, rx);

        let res = warp::test::request().path("/status").reply(&api).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["phase"], "ingesting");
        assert_eq!(body["attempted"], 3);
        assert_eq!(body["total"], 10);
    }

    #[tokio::test]
    async fn ingestion_publishes_and_reports_ready() {
        let shared = SharedIndex::new();
        let (reporter, rx) = ProgressReporter::channel();

        ingest(
            Arc::new(HashEmbedder::default()),
            None,
            shared.clone(),
            reporter,
        )
        .await;

        let index = shared.get().unwrap();
        assert_eq!(index.len(), corpus::embedded().texts.len());
        assert_eq!(
            *rx.borrow(),
            Progress::Ready {
                entries: index.len(),
                skipped: 0
            }
        );
    }
}
