//! Demo-signup handlers.
//!
//! Both endpoints answer 200 whatever the outcome: the result carries a
//! notification severity for the page to display.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use erpbtp_core::provisioning::CollectedProgress;
use erpbtp_core::signup::SignupRequest;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::response::DataResponse;
use crate::signup::SignupResult;
use crate::state::AppState;

/// SSE event name for each progress line.
pub const PROGRESS_EVENT: &str = "progress";

/// SSE event name for the terminal result.
pub const RESULT_EVENT: &str = "result";

/// Signup result plus every progress line emitted while it ran.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    #[serde(flatten)]
    pub result: SignupResult,
    pub progress: Vec<String>,
}

/// POST /signup
///
/// Run the signup and return once provisioning has finished or timed out.
pub async fn submit_signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Json<DataResponse<SignupResponse>> {
    let progress = CollectedProgress::new();
    let result = state.orchestrator.submit(&request, &progress).await;
    Json(DataResponse {
        data: SignupResponse {
            result,
            progress: progress.into_messages(),
        },
    })
}

enum StreamMessage {
    Progress(String),
    Result(Box<SignupResult>),
}

impl StreamMessage {
    fn into_event(self) -> Event {
        match self {
            StreamMessage::Progress(line) => Event::default().event(PROGRESS_EVENT).data(line),
            StreamMessage::Result(result) => {
                let message = result.notification.message.clone();
                Event::default()
                    .event(RESULT_EVENT)
                    .json_data(&*result)
                    .unwrap_or_else(|e| {
                        tracing::error!(error = %e, "Failed to serialize signup result");
                        Event::default().event(RESULT_EVENT).data(message)
                    })
            }
        }
    }
}

/// POST /signup/stream
///
/// Same workflow streamed as Server-Sent Events: one `progress` event per
/// progress line, then a single `result` event. The signup keeps running if
/// the client disconnects.
pub async fn stream_signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = state.orchestrator.clone();

    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let reporter = move |line: &str| {
            let _ = progress_tx.send(StreamMessage::Progress(line.to_string()));
        };
        let result = orchestrator.submit(&request, &reporter).await;
        let _ = tx.send(StreamMessage::Result(Box::new(result)));
    });

    let stream = UnboundedReceiverStream::new(rx).map(|message| Ok(message.into_event()));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
