use crls_lsp::{AnalyzerOptions, CrystalAnalyzer, DocumentSnapshot};
use tower_lsp::lsp_types::{DocumentHighlightKind, FormattingOptions, Position, TextEdit, Url};

const SOURCE: &str = r#"class Account
  property balance : Int32

  def deposit(amount : Int32)
    total = balance + amount
    self.balance = total
  end
end

acct = Account.new
acct.deposit(5)
puts "deposit done"
"#;

fn snapshot(text: &str) -> DocumentSnapshot {
    DocumentSnapshot::new(Url::parse("file:///workspace/account.cr").expect("uri"), text, 3)
}

fn apply(text: &str, edits: &[TextEdit]) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    for edit in edits {
        lines[edit.range.start.line as usize] = edit.new_text.clone();
    }
    lines.join("\n")
}

#[test]
fn definition_of_method_points_at_def_name() {
    let analyzer = CrystalAnalyzer::new();
    let doc = snapshot(SOURCE);

    let found = analyzer.definition(&doc, Position::new(10, 7));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].uri, doc.uri);
    assert_eq!(found[0].range.start, Position::new(3, 6));
    assert_eq!(found[0].range.end, Position::new(3, 13));
}

#[test]
fn definition_of_property_accessor_uses_declaration() {
    let analyzer = CrystalAnalyzer::new();
    let found = analyzer.definition(&snapshot(SOURCE), Position::new(4, 14));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].range.start.line, 1);
}

#[test]
fn references_skip_string_contents() {
    let analyzer = CrystalAnalyzer::new();
    let doc = snapshot(SOURCE);

    let all = analyzer.references(&doc, Position::new(3, 8), true);
    let lines: Vec<u32> = all.iter().map(|l| l.range.start.line).collect();
    assert_eq!(lines, vec![3, 10]);

    let reads = analyzer.references(&doc, Position::new(3, 8), false);
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].range.start, Position::new(10, 5));
}

#[test]
fn highlights_mark_declarations_as_writes() {
    let analyzer = CrystalAnalyzer::new();
    let highlights = analyzer.document_highlights(&snapshot(SOURCE), Position::new(4, 6));

    let kinds: Vec<(u32, Option<DocumentHighlightKind>)> =
        highlights.iter().map(|h| (h.range.start.line, h.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (4, Some(DocumentHighlightKind::WRITE)),
            (5, Some(DocumentHighlightKind::READ)),
        ]
    );
}

#[test]
fn formatting_is_idempotent() {
    let analyzer = CrystalAnalyzer::new();
    let messy = "class Account   \n      def deposit(amount)\n    total = amount \n        end\n  end\n";

    let edits = analyzer.formatting_edits(&snapshot(messy), None);
    assert!(!edits.is_empty());
    let formatted = apply(messy, &edits);
    assert_eq!(formatted, "class Account\n  def deposit(amount)\n    total = amount\n  end\nend\n");

    assert!(analyzer.formatting_edits(&snapshot(&formatted), None).is_empty());
}

#[test]
fn formatting_width_comes_from_options() {
    let analyzer = CrystalAnalyzer::with_options(AnalyzerOptions {
        indent_width: 4,
        ..AnalyzerOptions::default()
    });
    let doc = snapshot("def run\nend");

    let configured = analyzer.formatting_edits(&doc, None);
    assert_eq!(configured[0].new_text, "    def run");

    let editor = FormattingOptions {
        tab_size: 3,
        insert_spaces: true,
        ..Default::default()
    };
    let from_editor = analyzer.formatting_edits(&doc, Some(&editor));
    assert_eq!(from_editor[0].new_text, "   def run");
}
