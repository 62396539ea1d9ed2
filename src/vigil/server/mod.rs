// SPDX-License-Identifier: MIT

//! HTTP ingress
//!
//! Every request builds a fresh state and runs it through the shared
//! pipeline; invocations never share state with each other.

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::error::{Result, VigilError};
use super::pipeline::Pipeline;
use super::report::InvocationReport;
use super::simulator;
use crate::engine::observer::ChannelObserver;
use crate::engine::ExecutionEvent;

const EVENT_BUFFER: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .route("/api/graph", get(describe_graph))
        .route("/api/assessments", post(create_assessment))
        .route("/api/assessments/stream", post(stream_assessment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, pipeline: Pipeline) -> Result<()> {
    // TraceLayer reports through tracing; the log facade stays with env_logger
    if let Err(e) = tracing::subscriber::set_global_default(tracing_subscriber::fmt().finish()) {
        log::warn!("Tracing subscriber already installed: {}", e);
    }

    let app = router(AppState::new(pipeline));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

impl IntoResponse for VigilError {
    fn into_response(self) -> Response {
        let status = match &self {
            VigilError::Payload { .. } | VigilError::Json(_) => StatusCode::BAD_REQUEST,
            _ => {
                tracing::error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

/// Body of an assessment request; payloads are base64-encoded
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AssessmentRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub audio: Option<String>,
    /// Fill missing payloads with simulated sensor data
    #[serde(default)]
    pub simulate: bool,
}

impl AssessmentRequest {
    fn decode(&self) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>)> {
        let mut image = decode_field("image", self.image.as_deref())?;
        let mut audio = decode_field("audio", self.audio.as_deref())?;
        if self.simulate {
            image.get_or_insert_with(simulator::default_video_frame);
            audio.get_or_insert_with(simulator::default_audio_chunk);
        }
        Ok((image, audio))
    }
}

fn decode_field(field: &'static str, value: Option<&str>) -> Result<Option<Vec<u8>>> {
    value
        .map(|encoded| {
            BASE64
                .decode(encoded)
                .map_err(|source| VigilError::Payload { field, source })
        })
        .transpose()
}

/// One message of an assessment stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamMessage {
    Event(ExecutionEvent),
    Report(InvocationReport),
    Error(String),
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "System Operational" }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "nodes": state.pipeline.graph().node_names(),
    }))
}

async fn describe_graph(State(state): State<AppState>) -> Json<Value> {
    let graph = state.pipeline.graph();
    Json(json!({
        "entry_point": graph.entry_point(),
        "nodes": graph.node_names(),
        "edges": graph.describe(),
    }))
}

async fn create_assessment(
    State(state): State<AppState>,
    Json(request): Json<AssessmentRequest>,
) -> Result<Json<InvocationReport>> {
    let (image, audio) = request.decode()?;
    let report = state.pipeline.assess(image, audio).await;
    Ok(Json(report))
}

async fn stream_assessment(
    State(state): State<AppState>,
    Json(request): Json<AssessmentRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let (image, audio) = request.decode()?;
    let stream = assessment_messages(&state.pipeline, image, audio).map(|message| {
        Ok::<_, Infallible>(
            Event::default()
                .json_data(&message)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
        )
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1))))
}

/// Run one invocation in the background, yielding its execution events
/// followed by the final report
pub fn assessment_messages(
    pipeline: &Pipeline,
    image: Option<Vec<u8>>,
    audio: Option<Vec<u8>>,
) -> impl Stream<Item = StreamMessage> {
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let (report_tx, report_rx) = oneshot::channel();
    let observed = pipeline.observed_by(Arc::new(ChannelObserver::new(event_tx)));

    tokio::spawn(async move {
        let report = observed.assess(image, audio).await;
        if report_tx.send(report).is_err() {
            log::debug!("Assessment stream closed before the report was ready");
        }
    });

    // The event stream ends once the task drops its observer
    ReceiverStream::new(event_rx)
        .map(StreamMessage::Event)
        .chain(futures::stream::once(async move {
            match report_rx.await {
                Ok(report) => StreamMessage::Report(report),
                Err(e) => StreamMessage::Error(format!("Assessment aborted: {}", e)),
            }
        }))
}
