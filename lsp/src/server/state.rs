use std::hash::Hasher;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use ropey::Rope;
use tower_lsp::lsp_types::Url;
use tower_lsp::Client;
use twox_hash::XxHash64;

use crate::analyzer::{CrystalAnalyzer, DocumentSnapshot};

use super::config::ServerConfig;

/// An open Crystal document as the editor last described it.
#[derive(Debug, Default)]
pub(crate) struct Document {
    pub(crate) content: Rope,
    pub(crate) version: i32,
    /// Bumped on every edit; a scheduled publish only runs if it still matches.
    pub(crate) debounce_seq: u64,
    pub(crate) last_published_hash: Option<u64>,
}

impl Document {
    pub(crate) fn new(text: &str, version: i32) -> Self {
        Self {
            content: Rope::from_str(text),
            version,
            debounce_seq: 0,
            last_published_hash: None,
        }
    }

    pub(crate) fn content_hash(&self) -> u64 {
        let mut hasher = XxHash64::default();
        for chunk in self.content.chunks() {
            hasher.write(chunk.as_bytes());
        }
        hasher.finish()
    }
}

/// Server state shared across handlers.
pub(crate) struct CrystalLanguageServer {
    pub(crate) client: Client,
    pub(crate) documents: Arc<DashMap<Url, Document>>,
    pub(crate) config: Mutex<ServerConfig>,
}

impl CrystalLanguageServer {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DashMap::new()),
            config: Mutex::new(ServerConfig::default()),
        }
    }

    pub(crate) fn config(&self) -> ServerConfig {
        self.config.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn analyzer(&self) -> CrystalAnalyzer {
        CrystalAnalyzer::with_options(self.config().analyzer)
    }

    /// Owned copy of the current text, or `None` for a document that is not open.
    pub(crate) fn snapshot(&self, uri: &Url) -> Option<DocumentSnapshot> {
        let doc = self.documents.get(uri)?;
        Some(DocumentSnapshot::new(uri.clone(), doc.content.to_string(), doc.version))
    }
}
