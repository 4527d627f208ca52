use std::path::{Component, Path};

use anyhow::Context;
use tower_lsp::lsp_types::{DiagnosticSeverity, Url};

use crate::analyzer::{CrystalAnalyzer, DocumentSnapshot};

const USAGE: &str = "Usage: crls-lsp --analyze [--errors-only] <relative-file-path>\n  --analyze <file>     : Full analysis with JSON output\n  --errors-only        : Show only errors in simple format";

pub(crate) fn try_cli_analyze() -> anyhow::Result<Option<String>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() <= 1 {
        return Ok(None);
    }

    let Some(i) = args.iter().position(|a| a == "--analyze") else {
        return Ok(None);
    };
    let path = args[i + 1..]
        .iter()
        .find(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow::anyhow!(USAGE))?;
    let errors_only = args.iter().any(|a| a == "--errors-only");

    analyze_file(path, errors_only).map(Some)
}

/// Analyze one file relative to the working directory. Produces pretty JSON
/// with diagnostics, symbols and folding ranges, or with `errors_only` one
/// `Line L:C: message` line per error (1-based).
pub fn analyze_file(path: &str, errors_only: bool) -> anyhow::Result<String> {
    let content = read_file_content(path)?;
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let uri = Url::from_file_path(cwd.join(path)).map_err(|_| anyhow::anyhow!("Cannot build a file URI for '{}'", path))?;

    let analyzer = CrystalAnalyzer::new();
    let doc = DocumentSnapshot::new(uri, content, 0);
    let diagnostics = analyzer.analyze(&doc);

    if errors_only {
        let errors: Vec<String> = diagnostics
            .iter()
            .filter(|d| d.severity == Some(DiagnosticSeverity::ERROR))
            .map(|d| {
                format!(
                    "Line {}:{}: {}",
                    d.range.start.line + 1,
                    d.range.start.character + 1,
                    d.message
                )
            })
            .collect();

        if errors.is_empty() {
            return Ok("No errors found".to_string());
        }
        return Ok(errors.join("\n"));
    }

    let output = serde_json::json!({
        "diagnostics": diagnostics,
        "symbols": analyzer.document_symbols(&doc),
        "folding_ranges": analyzer.folding_ranges(&doc),
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Relative paths only: no `..`, no control characters, no drive letters.
pub fn is_safe_path(path: &str) -> bool {
    let path = Path::new(path);

    if path.as_os_str().is_empty() {
        return false;
    }
    if path.is_absolute() {
        return false;
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return false;
    }

    let s = path.to_string_lossy();
    let suspicious = ['\0', '\n', '\r', '\t'];
    if s.chars().any(|c| suspicious.contains(&c)) {
        return false;
    }
    !(s.len() >= 2 && s.as_bytes()[1] == b':')
}

fn read_file_content(path: &str) -> anyhow::Result<String> {
    if !is_safe_path(path) {
        return Err(anyhow::anyhow!("Unsafe file path: {}", path));
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path))
}
