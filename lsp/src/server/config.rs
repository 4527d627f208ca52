use serde::Deserialize;
use tower_lsp::lsp_types::ConfigurationItem;
use tracing::{info, warn};

use crate::analyzer::AnalyzerOptions;

use super::state::CrystalLanguageServer;

pub(crate) const CONFIG_SECTION: &str = "crystal.lsp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServerConfig {
    pub(crate) analyzer: AnalyzerOptions,
    pub(crate) diagnostics_enabled: bool,
    pub(crate) debounce_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerOptions::default(),
            diagnostics_enabled: true,
            debounce_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CrystalLspConfigSection {
    #[serde(default)]
    diagnostics: DiagnosticsConfig,
    #[serde(default)]
    analysis: AnalysisConfig,
    #[serde(default)]
    formatting: FormattingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DiagnosticsConfig {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    debounce_ms: Option<u64>,
    #[serde(default)]
    max_count: Option<usize>,
    #[serde(default)]
    undefined_identifiers: Option<bool>,
    #[serde(default)]
    parameter_syntax: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnalysisConfig {
    #[serde(default)]
    lookback_lines: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FormattingConfig {
    #[serde(default)]
    indent_width: Option<usize>,
}

/// Overlay a client section onto `base`. Absent fields keep their current
/// value; zero counts are ignored.
pub(crate) fn apply_section(base: &ServerConfig, value: serde_json::Value) -> Result<ServerConfig, serde_json::Error> {
    // An unset section arrives as `null`.
    if value.is_null() {
        return Ok(base.clone());
    }
    let section: CrystalLspConfigSection = serde_json::from_value(value)?;
    let mut cfg = base.clone();

    if let Some(v) = section.diagnostics.enabled {
        cfg.diagnostics_enabled = v;
    }
    if let Some(v) = section.diagnostics.debounce_ms.filter(|v| *v > 0) {
        cfg.debounce_ms = v;
    }
    if let Some(v) = section.diagnostics.max_count.filter(|v| *v > 0) {
        cfg.analyzer.max_diagnostics = v;
    }
    if let Some(v) = section.diagnostics.undefined_identifiers {
        cfg.analyzer.undefined_identifiers = v;
    }
    if let Some(v) = section.diagnostics.parameter_syntax {
        cfg.analyzer.parameter_syntax = v;
    }
    if let Some(v) = section.analysis.lookback_lines.filter(|v| *v > 0) {
        cfg.analyzer.lookback_lines = v;
    }
    if let Some(v) = section.formatting.indent_width.filter(|v| *v > 0) {
        cfg.analyzer.indent_width = v;
    }
    Ok(cfg)
}

impl CrystalLanguageServer {
    /// Pull the `crystal.lsp` section from the client. Returns whether the
    /// effective configuration changed.
    pub(crate) async fn load_config(&self) -> bool {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(CONFIG_SECTION.to_string()),
        }];

        let values = match self.client.configuration(items).await {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "client did not return configuration");
                return false;
            }
        };
        let Some(value) = values.into_iter().next() else {
            return false;
        };

        let current = self.config();
        match apply_section(&current, value) {
            Ok(next) if next != current => {
                info!(?next, "configuration reloaded");
                *self.config.lock().unwrap_or_else(|e| e.into_inner()) = next;
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "ignoring unparseable {CONFIG_SECTION} configuration");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_section_keeps_defaults() {
        let cfg = apply_section(&ServerConfig::default(), json!({ "diagnostics": { "debounceMs": 50 } }))
            .expect("valid section");
        assert_eq!(cfg.debounce_ms, 50);
        assert!(cfg.diagnostics_enabled);
        assert_eq!(cfg.analyzer, AnalyzerOptions::default());
    }

    #[test]
    fn nested_fields_map_onto_analyzer_options() {
        let value = json!({
            "diagnostics": { "enabled": false, "maxCount": 10, "undefinedIdentifiers": false },
            "analysis": { "lookbackLines": 500 },
            "formatting": { "indentWidth": 4 }
        });
        let cfg = apply_section(&ServerConfig::default(), value).expect("valid section");
        assert!(!cfg.diagnostics_enabled);
        assert_eq!(cfg.analyzer.max_diagnostics, 10);
        assert!(!cfg.analyzer.undefined_identifiers);
        assert!(cfg.analyzer.parameter_syntax);
        assert_eq!(cfg.analyzer.lookback_lines, 500);
        assert_eq!(cfg.analyzer.indent_width, 4);
    }

    #[test]
    fn zero_counts_and_null_are_ignored() {
        let value = json!({ "diagnostics": { "debounceMs": 0, "maxCount": 0 }, "analysis": { "lookbackLines": 0 } });
        let cfg = apply_section(&ServerConfig::default(), value).expect("valid section");
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(
            apply_section(&ServerConfig::default(), serde_json::Value::Null).expect("null"),
            ServerConfig::default()
        );
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(apply_section(&ServerConfig::default(), json!({ "diagnostics": { "enabled": "yes" } })).is_err());
    }
}
