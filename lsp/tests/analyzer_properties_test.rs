use std::collections::HashSet;

use crls_core::parse;
use crls_lsp::{CrystalAnalyzer, DocumentSnapshot};
use tower_lsp::lsp_types::{CompletionItemKind, Diagnostic, DiagnosticSeverity, Position, SymbolKind, Url};

fn snapshot(text: &str) -> DocumentSnapshot {
    DocumentSnapshot::new(Url::parse("file:///workspace/app.cr").expect("uri"), text, 1)
}

fn errors(diags: &[Diagnostic]) -> Vec<(u32, String)> {
    diags
        .iter()
        .filter(|d| d.severity == Some(DiagnosticSeverity::ERROR))
        .map(|d| (d.range.start.line, d.message.clone()))
        .collect()
}

#[test]
fn scenario_symbols_for_class_with_method() {
    let analyzer = CrystalAnalyzer::new();
    let symbols = analyzer.document_symbols(&snapshot("class Foo\n  def bar\n  end\nend"));

    let summary: Vec<(&str, SymbolKind, u32)> = symbols
        .iter()
        .map(|s| (s.name.as_str(), s.kind, s.location.range.start.line))
        .collect();
    assert_eq!(summary, vec![("Foo", SymbolKind::CLASS, 0), ("bar", SymbolKind::METHOD, 1)]);
}

#[test]
fn scenario_unclosed_string() {
    let analyzer = CrystalAnalyzer::new();
    let found = errors(&analyzer.analyze(&snapshot("puts \"unclosed")));
    assert!(found.contains(&(0, "Unclosed string literal".to_string())));
}

#[test]
fn scenario_member_completion_after_constructor() {
    let analyzer = CrystalAnalyzer::new();
    let text = "class Foo\n  def bar\n  end\nend\nx = Foo.new\nx.";
    let list = analyzer.complete(&snapshot(text), Position::new(5, 2));
    assert!(list
        .items
        .iter()
        .any(|i| i.label == "bar" && i.kind == Some(CompletionItemKind::METHOD)));
}

#[test]
fn scenario_unexpected_end() {
    let analyzer = CrystalAnalyzer::new();
    let found = errors(&analyzer.analyze(&snapshot("if true\n  puts 1\nend\nend")));
    assert_eq!(
        found,
        vec![(3, "Unexpected 'end' keyword - no matching opening statement".to_string())]
    );
}

#[test]
fn scenario_property_synthesis() {
    let table = parse("class Person\n  property age : Int32\nend");
    let person = table.class("Person").expect("class parsed");

    let getter = &person.methods["age"];
    assert!(getter.parameters.is_empty());
    assert_eq!(getter.return_type, "Int32");
    let setter = &person.methods["age="];
    assert_eq!(setter.parameters.len(), 1);
    assert_eq!(setter.parameters[0].type_name, "Int32");

    let prop = &person.properties["age"];
    assert!(prop.has_getter);
    assert!(prop.has_setter);
}

#[test]
fn property_synthesis_adds_exactly_two_methods() {
    for (decl, ty) in [("property name", "Object"), ("property count : Int64", "Int64"), ("property ok : Bool", "Bool")] {
        let base = parse("class Box\n  def open\n  end\nend");
        let with_prop = parse(&format!("class Box\n  def open\n  end\n  {decl}\nend"));
        let before = base.class("Box").expect("class").methods.len();
        let after = with_prop.class("Box").expect("class");
        assert_eq!(after.methods.len(), before + 2, "{decl}");

        let name = decl.split_whitespace().nth(1).expect("name");
        assert_eq!(after.methods[name].return_type, ty, "{decl}");
        assert_eq!(after.methods[&format!("{name}=")].parameters[0].type_name, ty, "{decl}");
        let prop = &after.properties[name];
        assert!(prop.has_getter && prop.has_setter && !prop.is_read_only, "{decl}");
    }
}

#[test]
fn analysis_is_idempotent() {
    let analyzer = CrystalAnalyzer::new();
    let doc = snapshot("class Foo\n  def bar(x : Int32, y z)\n    puts \"open\n  end\nend\nend\nundefined_thing");

    assert_eq!(analyzer.analyze(&doc), analyzer.analyze(&doc));
    assert_eq!(analyzer.document_symbols(&doc), analyzer.document_symbols(&doc));
}

#[test]
fn balance_follows_stack_semantics() {
    let analyzer = CrystalAnalyzer::new();

    // Properly nested with one surplus `end`.
    let nested = "class A\n  def b\n    if c\n    end\n  end\nend\nend";
    assert_eq!(
        errors(&analyzer.analyze(&snapshot(nested))),
        vec![(6, "Unexpected 'end' keyword - no matching opening statement".to_string())]
    );

    // The inner `end` closes `while`; `if` stays open.
    let unclosed = "if a\n  while b\n  end";
    assert_eq!(
        errors(&analyzer.analyze(&snapshot(unclosed))),
        vec![(0, "Unclosed 'if' statement - missing 'end'".to_string())]
    );

    // Equal counts that cross: an early surplus `end` and a late opener.
    let crossing = "def a\nend\nend\ndef b";
    let found = errors(&analyzer.analyze(&snapshot(crossing)));
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].0, 2);
    assert_eq!(found[1], (3, "Unclosed 'def' statement - missing 'end'".to_string()));
}

#[test]
fn general_completion_obeys_prefix_law() {
    let analyzer = CrystalAnalyzer::new();
    let header = "class Shape\nend\nclass Circle < Shape\nend\nstatus = 1\nscale = 2.5\nx = ";

    let labels_for = |partial: &str| -> HashSet<String> {
        let text = format!("{header}{partial}");
        let line = text.lines().count() as u32 - 1;
        let character = format!("x = {partial}").len() as u32;
        analyzer
            .complete(&snapshot(&text), Position::new(line, character))
            .items
            .into_iter()
            .map(|i| i.label)
            .collect()
    };

    let everything = labels_for("");
    assert!(everything.contains("Circle"));
    assert!(everything.contains("status"));
    for partial in ["s", "S", "sc", "CL", "whi", "zzz"] {
        let items = labels_for(partial);
        for label in &items {
            assert!(
                label.to_lowercase().starts_with(&partial.to_lowercase()),
                "{label} does not match {partial}"
            );
        }
        assert!(items.is_subset(&everything), "prefix {partial} is not a subset");
    }
    assert!(labels_for("zzz").is_empty());
}
