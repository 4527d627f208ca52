use tokio::task;
use tokio::time::{sleep, Duration};
use tower_lsp::lsp_types::{notification, PublishDiagnosticsParams, Url};
use tracing::{debug, warn};

use crate::analyzer::{CrystalAnalyzer, DocumentSnapshot};

use super::state::CrystalLanguageServer;

impl CrystalLanguageServer {
    /// Run a read-only query against the current text of `uri` on the
    /// blocking pool. `None` if the document is not open or the query
    /// panicked.
    pub(crate) async fn run_query<T, F>(&self, uri: &Url, query: F) -> Option<T>
    where
        F: FnOnce(&CrystalAnalyzer, &DocumentSnapshot) -> T + Send + 'static,
        T: Send + 'static,
    {
        let snapshot = self.snapshot(uri)?;
        let analyzer = self.analyzer();
        match task::spawn_blocking(move || query(&analyzer, &snapshot)).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(%uri, error = %e, "analysis task failed");
                None
            }
        }
    }

    /// Publish diagnostics for `uri` once edits settle. A newer edit, a
    /// version mismatch or an unchanged content hash cancels the publish.
    pub(crate) fn schedule_diagnostics(&self, uri: Url, scheduled_version: i32) {
        let config = self.config();
        if !config.diagnostics_enabled {
            return;
        }
        let Some(seq_snapshot) = self.documents.get(&uri).map(|doc| doc.debounce_seq) else {
            return;
        };
        let documents = self.documents.clone();
        let client = self.client.clone();
        let analyzer = CrystalAnalyzer::with_options(config.analyzer);
        let delay_ms = config.debounce_ms;

        tokio::spawn(async move {
            sleep(Duration::from_millis(delay_ms)).await;

            let (snapshot, hash) = match documents.get(&uri) {
                Some(doc) if doc.version == scheduled_version && doc.debounce_seq == seq_snapshot => {
                    let hash = doc.content_hash();
                    if doc.last_published_hash == Some(hash) {
                        debug!(%uri, "content unchanged since last publish");
                        return;
                    }
                    (DocumentSnapshot::new(uri.clone(), doc.content.to_string(), doc.version), hash)
                }
                _ => return,
            };

            let diagnostics = match task::spawn_blocking(move || analyzer.analyze(&snapshot)).await {
                Ok(diagnostics) => diagnostics,
                Err(e) => {
                    warn!(%uri, error = %e, "diagnostics task failed");
                    return;
                }
            };

            match documents.get_mut(&uri) {
                Some(mut doc) if doc.debounce_seq == seq_snapshot => doc.last_published_hash = Some(hash),
                _ => return,
            }

            debug!(%uri, version = scheduled_version, count = diagnostics.len(), "publishing diagnostics");
            client
                .send_notification::<notification::PublishDiagnostics>(PublishDiagnosticsParams {
                    uri,
                    version: Some(scheduled_version),
                    diagnostics,
                })
                .await;
        });
    }

    pub(crate) async fn clear_diagnostics(&self, uri: Url) {
        self.client
            .send_notification::<notification::PublishDiagnostics>(PublishDiagnosticsParams {
                uri,
                version: None,
                diagnostics: Vec::new(),
            })
            .await;
    }

    /// Force a fresh publish for every open document, e.g. after a
    /// configuration change that alters what the checks report.
    pub(crate) async fn republish_all(&self) {
        let targets: Vec<(Url, i32)> = self
            .documents
            .iter_mut()
            .map(|mut entry| {
                entry.last_published_hash = None;
                (entry.key().clone(), entry.version)
            })
            .collect();

        if !self.config().diagnostics_enabled {
            for (uri, _) in targets {
                self.clear_diagnostics(uri).await;
            }
            return;
        }
        for (uri, version) in targets {
            self.schedule_diagnostics(uri, version);
        }
    }
}
