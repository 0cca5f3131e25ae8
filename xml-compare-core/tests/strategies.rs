use std::collections::BTreeMap;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use xml_compare_core::diff::comparison::{ComparisonKind, ComparisonResult};
use xml_compare_core::diff::evaluator::{Chain, DefaultSimilarity};
use xml_compare_core::diff::listener::StopWhenDifferent;
use xml_compare_core::diff::matcher::DefaultNodeMatcher;
use xml_compare_core::diff::placeholder::PlaceholderEvaluator;
use xml_compare_core::diff::selector::{by_name, by_name_and_attributes, conditional_builder};
use xml_compare_core::{compare, parse, parse_file, DiffBuilder, NodeKind};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fixtures")
        .join(path)
}

fn kinds(diff: &xml_compare_core::Diff<'_>) -> Vec<(ComparisonKind, ComparisonResult)> {
    diff.differences()
        .map(|d| (d.comparison.kind, d.result))
        .collect()
}

#[test]
fn conditional_selector_pairs_books_by_id() {
    let control = parse_file(&fixture("catalog_control.xml")).expect("control parse");
    let test = parse_file(&fixture("catalog_reordered.xml")).expect("test parse");

    assert!(compare(&control, &test).has_differences());

    let selector = conditional_builder()
        .when_element_is_named("book")
        .then_use(by_name_and_attributes(&["id"]))
        .else_use(by_name())
        .build();
    let diff = DiffBuilder::compare(&control, &test)
        .with_node_matcher(DefaultNodeMatcher::new(selector))
        .build();

    assert!(diff.is_empty(), "unexpected differences:\n{}", diff.render());
}

#[test]
fn placeholders_accept_families_of_values() {
    let control = parse_file(&fixture("catalog_placeholders.xml")).expect("control parse");
    let test = parse_file(&fixture("catalog_changed.xml")).expect("test parse");

    let diff = DiffBuilder::compare(&control, &test)
        .with_difference_evaluator(PlaceholderEvaluator::new().expect("default delimiters"))
        .build();

    assert!(diff.is_empty(), "unexpected differences:\n{}", diff.render());
}

#[test]
fn placeholder_number_check_rejects_text() {
    let control = parse(b"<price>${xmlcompare.isNumber}</price>").expect("control parse");
    let test = parse(b"<price>cheap</price>").expect("test parse");

    let diff = DiffBuilder::compare(&control, &test)
        .with_difference_evaluator(PlaceholderEvaluator::new().expect("default delimiters"))
        .build();

    assert_eq!(
        kinds(&diff),
        vec![(ComparisonKind::TextValue, ComparisonResult::Different)]
    );
}

#[test]
fn default_similarity_downgrades_prefix_changes() {
    let control = parse(br#"<p:a xmlns:p="urn:x"/>"#).expect("control parse");
    let test = parse(br#"<q:a xmlns:q="urn:x"/>"#).expect("test parse");

    let similar = DiffBuilder::compare(&control, &test)
        .with_difference_evaluator(DefaultSimilarity)
        .build();
    assert_eq!(
        kinds(&similar),
        vec![(ComparisonKind::NamespacePrefix, ComparisonResult::Similar)]
    );
    assert!(!similar.has_differences());
    assert!(similar.has_similar());

    let identical = DiffBuilder::compare(&control, &test)
        .with_difference_evaluator(DefaultSimilarity)
        .check_for_identical()
        .build();
    assert!(identical.has_differences());
}

#[test]
fn schema_locations_are_compared_separately() {
    let control = parse(
        br#"<a xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="a.xsd"/>"#,
    )
    .expect("control parse");
    let test = parse(
        br#"<a xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="b.xsd"/>"#,
    )
    .expect("test parse");

    assert_eq!(
        kinds(&compare(&control, &test)),
        vec![(ComparisonKind::NoNamespaceSchemaLocation, ComparisonResult::Different)]
    );

    let evaluator = Chain::new().then(DefaultSimilarity);
    let diff = DiffBuilder::compare(&control, &test)
        .with_difference_evaluator(evaluator)
        .build();
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonKind::NoNamespaceSchemaLocation, ComparisonResult::Similar)]
    );
}

#[test]
fn doctype_presence_is_a_document_fact() {
    let control = parse(br#"<!DOCTYPE a SYSTEM "a.dtd"><a/>"#).expect("control parse");
    let test = parse(b"<a/>").expect("test parse");

    assert_eq!(
        kinds(&compare(&control, &test)),
        vec![(ComparisonKind::HasDoctypeDeclaration, ComparisonResult::Different)]
    );
}

#[test]
fn stop_when_different_halts_after_first_difference() {
    let control = parse_file(&fixture("catalog_control.xml")).expect("control parse");
    let test = parse_file(&fixture("catalog_changed.xml")).expect("test parse");

    let diff = DiffBuilder::compare(&control, &test)
        .with_comparison_controller(StopWhenDifferent)
        .build();
    let differences: Vec<_> = diff.differences().collect();

    assert_eq!(differences.len(), 1);
    assert_eq!(
        differences[0].comparison.kind,
        ComparisonKind::ElementNumAttributes
    );
    assert_eq!(differences[0].comparison.position(), "/catalog[1]/book[2]");
}

#[test]
fn node_filter_can_drop_comments() {
    let control = parse(b"<a><!-- note --><b/></a>").expect("control parse");
    let test = parse(b"<a><b/></a>").expect("test parse");

    assert!(compare(&control, &test).has_differences());

    let diff = DiffBuilder::compare(&control, &test)
        .with_node_filter(|node| node.kind != NodeKind::Comment)
        .build();
    assert!(diff.is_empty());
}

#[test]
fn node_filter_keeps_doctype_on_the_document_node() {
    let control = parse(br#"<!DOCTYPE a SYSTEM "a.dtd"><!-- v1 --><a/>"#).expect("control parse");
    let test = parse(br#"<!DOCTYPE a SYSTEM "b.dtd"><a/>"#).expect("test parse");

    let diff = DiffBuilder::compare(&control, &test)
        .with_node_filter(|node| node.kind != NodeKind::Comment)
        .build();
    let differences: Vec<_> = diff.differences().collect();

    assert_eq!(differences.len(), 1, "unexpected differences:\n{}", diff.render());
    assert_eq!(differences[0].comparison.kind, ComparisonKind::DoctypeSystemId);
    assert_eq!(differences[0].comparison.position(), "/");
}

#[test]
fn attribute_filter_can_drop_volatile_attributes() {
    let control = parse(br#"<a id="1" stamp="10:00"/>"#).expect("control parse");
    let test = parse(br#"<a id="1" stamp="11:30"/>"#).expect("test parse");

    let diff = DiffBuilder::compare(&control, &test)
        .with_attribute_filter(|attr| attr.name.local != "stamp")
        .build();
    assert!(diff.is_empty());
}

#[test]
fn namespace_context_prefixes_positions() {
    let control = parse(br#"<a xmlns="urn:x"><b>1</b></a>"#).expect("control parse");
    let test = parse(br#"<a xmlns="urn:x"><b>2</b></a>"#).expect("test parse");

    let plain = compare(&control, &test);
    let positions: Vec<_> = plain.differences().map(|d| d.comparison.position().to_string()).collect();
    assert_eq!(positions, vec!["/a[1]/b[1]/text()[1]".to_string()]);

    let mut namespaces = BTreeMap::new();
    namespaces.insert("n".to_string(), "urn:x".to_string());
    let prefixed = DiffBuilder::compare(&control, &test)
        .with_namespace_context(namespaces)
        .build();
    let positions: Vec<_> = prefixed
        .differences()
        .map(|d| d.comparison.position().to_string())
        .collect();
    assert_eq!(positions, vec!["/n:a[1]/n:b[1]/text()[1]".to_string()]);
}
