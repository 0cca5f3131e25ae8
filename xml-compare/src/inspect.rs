use std::collections::BTreeMap;

use xml_compare_core::{NodeKind, PositionTracker, XmlNode};

/// Render a parsed tree, one node per line with its position, down to `max_depth`.
pub fn render_tree(node: &XmlNode, max_depth: usize, namespaces: &BTreeMap<String, String>) -> String {
    let mut tracker = PositionTracker::for_root(node, namespaces);
    let mut out = String::new();
    render_node(node, 0, max_depth, &mut tracker, &mut out);
    out
}

fn render_node(
    node: &XmlNode,
    depth: usize,
    max_depth: usize,
    tracker: &mut PositionTracker,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{indent}{} {}\n", tracker.current_path(), describe(node)));

    if depth >= max_depth {
        return;
    }

    let children: Vec<&XmlNode> = node.children.iter().collect();
    tracker.set_children(&children);
    for (idx, child) in children.iter().enumerate() {
        tracker.enter_child(idx);
        render_node(child, depth + 1, max_depth, tracker, out);
        tracker.leave();
    }
}

fn describe(node: &XmlNode) -> String {
    match node.kind {
        NodeKind::Document => match &node.declaration {
            Some(decl) => format!(
                "document version={} encoding={}",
                decl.version.as_deref().unwrap_or("1.0"),
                decl.encoding.as_deref().unwrap_or("-")
            ),
            None => "document".to_string(),
        },
        NodeKind::Element => {
            let attrs: Vec<String> = node
                .attributes
                .iter()
                .map(|attr| format!("{}={:?}", attr.name, attr.value))
                .collect();
            let name = node.name.as_ref().map(|n| n.to_string()).unwrap_or_default();
            if attrs.is_empty() {
                format!("<{name}>")
            } else {
                format!("<{name} {}>", attrs.join(" "))
            }
        }
        _ => match node.value() {
            Ok(value) => format!("{} {:?}", node.kind, value.unwrap_or("")),
            Err(err) => format!("{} <{err}>", node.kind),
        },
    }
}
