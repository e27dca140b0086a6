//! Server-Sent Events stream and results-tree watcher.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::path::{Component, Path};
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{AppState, ChangeEvent};

/// How often to check for a results root that does not exist yet.
const ROOT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct SsePayload<'a> {
    #[serde(rename = "type")]
    event_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contrast: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
}

impl<'a> From<&'a ChangeEvent> for SsePayload<'a> {
    fn from(event: &'a ChangeEvent) -> Self {
        let empty = SsePayload {
            event_type: "",
            subject: None,
            method: None,
            contrast: None,
            run_group: None,
            file: None,
        };
        match event {
            ChangeEvent::RootChanged => SsePayload {
                event_type: "root_changed",
                ..empty
            },
            ChangeEvent::TreeChanged { subject } => SsePayload {
                event_type: "tree_changed",
                subject: Some(subject.as_str()),
                ..empty
            },
            ChangeEvent::ArtifactWritten {
                subject,
                method,
                contrast,
                run_group,
                file,
            } => SsePayload {
                event_type: "artifact_written",
                subject: Some(subject.as_str()),
                method: Some(method.as_str()),
                contrast: Some(contrast.as_str()),
                run_group: Some(run_group.as_str()),
                file: Some(file.as_str()),
            },
        }
    }
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        // Send initial connected event
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    let payload = SsePayload::from(&change_event);
                    if let Ok(json) = serde_json::to_string(&payload) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Start the results-tree watcher in a background task.
pub fn start_tree_watcher(state: AppState) {
    tokio::spawn(async move {
        if let Err(e) = run_tree_watcher(state).await {
            warn!(error = %e, "tree watcher failed");
        }
    });
}

async fn run_tree_watcher(state: AppState) -> anyhow::Result<()> {
    let root = state.results_dir().to_path_buf();

    // The pipeline may create the root after the server starts.
    if !root.is_dir() {
        info!(path = %root.display(), "results root not found, waiting for it");
        let mut poll = tokio::time::interval(ROOT_POLL_INTERVAL);
        while !root.is_dir() {
            poll.tick().await;
        }
        let _ = state.event_tx.send(ChangeEvent::RootChanged);
    }

    let (tx, mut rx) = mpsc::channel::<NotifyEvent>(100);

    let tx_clone = tx.clone();
    let mut watcher = PollWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx_clone.try_send(event);
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_millis(500)),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(path = %root.display(), "watching results tree");

    // Batch at a fixed interval; the pipeline writes many files per stage.
    let mut pending_events: Vec<NotifyEvent> = Vec::new();
    let mut flush_tick = tokio::time::interval(Duration::from_millis(250));
    flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                pending_events.push(event);
            }
            _ = flush_tick.tick() => {
                if pending_events.is_empty() {
                    continue;
                }
                process_events(&state, &pending_events);
                pending_events.clear();
            }
        }
    }
}

fn process_events(state: &AppState, events: &[NotifyEvent]) {
    let root = state.results_dir();
    let mut changes = BTreeSet::new();

    for event in events {
        let written = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
        let removed = matches!(event.kind, EventKind::Remove(_));
        if !written && !removed {
            continue;
        }
        for path in &event.paths {
            if let Some(change) = classify_path(root, path, written) {
                changes.insert(change);
            }
        }
    }

    for change in changes {
        debug!(change = ?change, "broadcasting tree change");
        let _ = state.event_tx.send(change);
    }
}

/// Map a changed path to the event a viewer cares about.
///
/// Depth is counted below the results root: 1 is a subject, 4 a run group,
/// 5 a file inside a run group.
fn classify_path(root: &Path, path: &Path, written: bool) -> Option<ChangeEvent> {
    let rel = path.strip_prefix(root).ok()?;
    let segments: Vec<&str> = rel
        .components()
        .map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;

    match segments.as_slice() {
        [] | [_] => Some(ChangeEvent::RootChanged),
        [subject, method, contrast, run_group, file] if written => {
            Some(ChangeEvent::ArtifactWritten {
                subject: subject.to_string(),
                method: method.to_string(),
                contrast: contrast.to_string(),
                run_group: run_group.to_string(),
                file: file.to_string(),
            })
        }
        [subject, ..] => Some(ChangeEvent::TreeChanged {
            subject: subject.to_string(),
        }),
    }
}
