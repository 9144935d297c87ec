use crate::emit::DocumentSink;
use crate::pipeline::{ExportSummary, Paginator};
use crate::rendering::RenderedView;
use crate::{Error, ExportConfig, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::oneshot;

/// Where the exporter is in its lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum ExportState {
    Idle,
    Running,
    Succeeded(PathBuf),
    /// Holds the user-facing message of the failure
    Failed(String),
}

/// What happened to a download request
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Saved(ExportSummary),
    /// Another export was already running; the request was dropped.
    Ignored,
}

enum Command {
    Export {
        view: RenderedView,
        subject: String,
        resp: oneshot::Sender<Result<ExportSummary>>,
    },
    Close(oneshot::Sender<()>),
}

/// An async-friendly export controller backed by a dedicated worker thread.
///
/// The worker owns the paginator, its fonts and the save destination, and
/// runs one pass at a time. While a pass is running further download
/// requests are ignored rather than queued.
#[derive(Clone)]
pub struct Exporter {
    cmd_tx: Sender<Command>,
    state: Arc<Mutex<ExportState>>,
}

impl Exporter {
    /// Spawn the worker with the built-in renderer. Fonts are loaded on the
    /// worker thread.
    pub async fn new<S>(config: ExportConfig, sink: S) -> Result<Self>
    where
        S: DocumentSink + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();
        let state = Arc::new(Mutex::new(ExportState::Idle));
        let worker_state = Arc::clone(&state);

        thread::spawn(move || {
            let paginator = match Paginator::with_software_renderer(config) {
                Ok(p) => p,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Export { view, subject, resp } => {
                        let res = paginator.export(&view, &subject, &sink);
                        let next = match &res {
                            Ok(summary) => ExportState::Succeeded(summary.path.clone()),
                            Err(e) => ExportState::Failed(e.user_message().to_string()),
                        };
                        set_state(&worker_state, next);
                        // The caller may have gone away; the result is dropped.
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
            log::debug!("export worker stopped");
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx, state })
    }

    pub fn state(&self) -> ExportState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn is_running(&self) -> bool {
        self.state() == ExportState::Running
    }

    /// Export `view` and save it under a filename derived from `subject`.
    ///
    /// Returns [`DownloadOutcome::Ignored`] without doing anything when an
    /// export is already running.
    pub async fn download(&self, view: RenderedView, subject: &str) -> Result<DownloadOutcome> {
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| Error::Other("export state poisoned".into()))?;
            if *state == ExportState::Running {
                log::debug!("download requested while an export is running; ignoring");
                return Ok(DownloadOutcome::Ignored);
            }
            *state = ExportState::Running;
        }

        let (tx, rx) = oneshot::channel();
        let cmd = Command::Export { view, subject: subject.to_string(), resp: tx };
        if self.cmd_tx.send(cmd).is_err() {
            let err = Error::Other("export worker has stopped".into());
            set_state(&self.state, ExportState::Failed(err.user_message().to_string()));
            return Err(err);
        }
        let res = rx
            .await
            .map_err(|e| Error::Other(format!("Export canceled: {}", e)))?;
        res.map(DownloadOutcome::Saved)
    }

    /// Stop the worker once any running export has finished.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}

fn set_state(state: &Mutex<ExportState>, next: ExportState) {
    match state.lock() {
        Ok(mut s) => *s = next,
        Err(poisoned) => *poisoned.into_inner() = next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::MemorySink;

    fn config() -> ExportConfig {
        ExportConfig { timeout_ms: 60_000, ..Default::default() }
    }

    #[tokio::test]
    async fn starts_idle_and_records_success() {
        let exporter = Exporter::new(config(), MemorySink::new()).await.unwrap();
        assert_eq!(exporter.state(), ExportState::Idle);

        let view = RenderedView::from_html(r#"<div data-pdf-block style="height: 40px"></div>"#);
        let outcome = exporter.download(view, "Acme Corp").await.unwrap();
        match outcome {
            DownloadOutcome::Saved(summary) => {
                assert_eq!(summary.filename, "Acme_Corp_Proposal.pdf");
                assert_eq!(summary.page_count, 1);
            }
            DownloadOutcome::Ignored => panic!("first download must not be ignored"),
        }
        assert_eq!(exporter.state(), ExportState::Succeeded(PathBuf::from("Acme_Corp_Proposal.pdf")));
        exporter.close().await.unwrap();
    }

    #[tokio::test]
    async fn failure_is_recorded_with_user_message() {
        let exporter = Exporter::new(config(), MemorySink::new()).await.unwrap();
        let err = exporter.download(RenderedView::from_html(""), "Acme").await.unwrap_err();
        assert!(matches!(err, Error::NoContent));
        assert_eq!(
            exporter.state(),
            ExportState::Failed(Error::NoContent.user_message().to_string())
        );
    }

    #[tokio::test]
    async fn bad_font_path_fails_init() {
        let config = ExportConfig {
            font_path: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..Default::default()
        };
        assert!(Exporter::new(config, MemorySink::new()).await.is_err());
    }
}
