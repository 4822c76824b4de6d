//! Command loop for interactive sessions.
//!
//! Receives commands from the UI thread and runs each against the file list controller
//! as its own task, so a long upload never blocks refresh, delete, or download.

use super::file_list::FileListController;
use crate::model::{AppEvent, UploadFile, UploadRequest};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Refresh,
    Delete(String),
    Download(String),
    Submit {
        paths: Vec<PathBuf>,
        generate_excel: bool,
        generate_ppt: bool,
    },
    Quit,
}

/// Read the staged paths; any unreadable file aborts the submission with an alert.
async fn load_files(
    paths: &[PathBuf],
    event_tx: &UnboundedSender<AppEvent>,
) -> Option<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for p in paths {
        match UploadFile::from_path(p).await {
            Ok(f) => files.push(f),
            Err(e) => {
                warn!(path = %p.display(), error = %e, "cannot read staged file");
                let _ = event_tx.send(AppEvent::Alert(format!("{e:#}")));
                return None;
            }
        }
    }
    Some(files)
}

pub(crate) async fn run_controller(
    ctrl: Arc<FileListController>,
    event_tx: UnboundedSender<AppEvent>,
    download_dir: PathBuf,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut tasks = JoinSet::new();
    {
        let ctrl = ctrl.clone();
        tasks.spawn(async move {
            let _ = ctrl.refresh().await;
        });
    }

    while let Some(cmd) = cmd_rx.recv().await {
        debug!(?cmd, "ui command");
        let ctrl = ctrl.clone();
        match cmd {
            UiCommand::Quit => break,
            // A manual refresh while one is already running is coalesced; refreshes
            // triggered by delete/upload still run unconditionally.
            UiCommand::Refresh if ctrl.is_refreshing() => {
                debug!("refresh already in flight");
            }
            UiCommand::Refresh => {
                tasks.spawn(async move {
                    let _ = ctrl.refresh().await;
                });
            }
            UiCommand::Delete(name) => {
                tasks.spawn(async move {
                    let _ = ctrl.remove(&name).await;
                });
            }
            UiCommand::Download(name) => {
                let dir = download_dir.clone();
                tasks.spawn(async move {
                    let _ = ctrl.download(&name, &dir).await;
                });
            }
            UiCommand::Submit {
                paths,
                generate_excel,
                generate_ppt,
            } => {
                if ctrl.is_submitting() {
                    continue;
                }
                let event_tx = event_tx.clone();
                tasks.spawn(async move {
                    let Some(files) = load_files(&paths, &event_tx).await else {
                        return;
                    };
                    let req = UploadRequest {
                        files,
                        generate_excel,
                        generate_ppt,
                    };
                    let _ = ctrl.submit(req).await;
                });
            }
        }

        // Reap finished tasks so the set does not grow for the whole session.
        while let Some(res) = tasks.try_join_next() {
            if let Err(e) = res {
                warn!(error = %e, "controller task failed");
            }
        }
    }

    tasks.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::test_config;
    use crate::engine::ApiClient;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn unreadable_staged_file_alerts_without_upload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/output_files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cfg = test_config(&server.uri());
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let ctrl = Arc::new(FileListController::new(
            ApiClient::new(&cfg).unwrap(),
            "json",
            event_tx.clone(),
        ));
        let loop_handle = tokio::spawn(run_controller(
            ctrl,
            event_tx,
            cfg.download_dir.clone(),
            cmd_rx,
        ));

        cmd_tx
            .send(UiCommand::Submit {
                paths: vec![PathBuf::from("/definitely/missing/input.json")],
                generate_excel: true,
                generate_ppt: false,
            })
            .unwrap();

        let alert = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(ev) = event_rx.recv().await {
                if let AppEvent::Alert(m) = ev {
                    return Some(m);
                }
            }
            None
        })
        .await
        .unwrap();
        assert!(alert.unwrap().contains("input.json"));

        cmd_tx.send(UiCommand::Quit).unwrap();
        loop_handle.await.unwrap().unwrap();
    }
}
