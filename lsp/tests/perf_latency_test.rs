use crls_lsp::{CrystalAnalyzer, DocumentSnapshot};
use std::time::{Duration, Instant};
use tower_lsp::lsp_types::{Position, Url};

fn assert_under(label: &str, dur: Duration, max: Duration) {
    eprintln!("{} took: {:?} (limit: {:?})", label, dur, max);
    assert!(dur <= max, "{} exceeded budget: {:?} > {:?}", label, dur, max);
}

fn large_document(classes: usize) -> String {
    let mut doc = String::with_capacity(classes * 400);
    for i in 0..classes {
        doc.push_str(&format!("# Service number {i}\nclass Service{i}\n"));
        doc.push_str("  property name : String\n");
        doc.push_str(&format!("  def handle{i}(input : String, retries : Int32 = 3) : Bool\n"));
        doc.push_str("    count = input.size\n");
        doc.push_str("    if count > retries\n      puts \"too long\"\n    end\n    true\n  end\nend\n");
        doc.push_str(&format!("svc{i} = Service{i}.new\n"));
    }
    doc
}

#[test]
fn test_analyze_large_document_latency() {
    let analyzer = CrystalAnalyzer::new();
    let text = large_document(300);
    let doc = DocumentSnapshot::new(Url::parse("file:///tmp/large.cr").expect("uri"), text, 1);

    let start = Instant::now();
    let diagnostics = analyzer.analyze(&doc);
    let elapsed = start.elapsed();

    assert!(
        diagnostics.iter().all(|d| !d.message.starts_with("Unclosed")),
        "generated document should be balanced"
    );
    // Debug builds vary; keep the budget generous
    assert_under("analyze(large doc)", elapsed, Duration::from_millis(3000));
}

#[test]
fn test_member_completion_latency() {
    let analyzer = CrystalAnalyzer::new();
    let mut text = large_document(300);
    text.push_str("svc42.");
    let last_line = text.lines().count() as u32 - 1;
    let doc = DocumentSnapshot::new(Url::parse("file:///tmp/large.cr").expect("uri"), text, 1);

    let start = Instant::now();
    let list = analyzer.complete(&doc, Position::new(last_line, 6));
    let elapsed = start.elapsed();

    assert!(list.items.iter().any(|i| i.label == "handle42"));
    assert_under("complete(large doc)", elapsed, Duration::from_millis(1500));
}
