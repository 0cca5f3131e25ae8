//! Path-like location tracking during a traversal.

use std::collections::{BTreeMap, HashMap};

use crate::tree::{NodeKind, QName, XmlNode};

/// Builds XPath-like locations (`/root[1]/item[2]/@id`) for one side of a comparison.
///
/// Every `enter_*` call must be matched by a [`leave`](Self::leave).
#[derive(Debug, Clone)]
pub struct PositionTracker {
    /// Namespace URI -> prefix used when rendering element and attribute steps.
    prefixes: HashMap<String, String>,
    levels: Vec<Level>,
}

#[derive(Debug, Clone, Default)]
struct Level {
    step: String,
    children: Vec<String>,
}

impl PositionTracker {
    /// Create a tracker positioned above the root. `namespaces` maps prefix -> URI.
    pub fn new(namespaces: &BTreeMap<String, String>) -> Self {
        let prefixes = namespaces
            .iter()
            .map(|(prefix, uri)| (uri.clone(), prefix.clone()))
            .collect();
        Self {
            prefixes,
            levels: vec![Level::default()],
        }
    }

    /// Create a tracker that has already entered `root`.
    pub fn for_root(root: &XmlNode, namespaces: &BTreeMap<String, String>) -> Self {
        let mut tracker = Self::new(namespaces);
        tracker.set_children(&[root]);
        tracker.enter_child(0);
        tracker
    }

    /// Register the child list of the node currently visited.
    pub fn set_children(&mut self, children: &[&XmlNode]) {
        let mut counters: HashMap<String, usize> = HashMap::new();
        let steps = children
            .iter()
            .map(|child| {
                let (key, base) = self.step_base(child);
                let Some(key) = key else {
                    return base;
                };
                let index = counters.entry(key).or_insert(0);
                *index += 1;
                format!("{base}[{index}]")
            })
            .collect();
        if let Some(level) = self.levels.last_mut() {
            level.children = steps;
        }
    }

    /// Descend into the child at `index` of the list given to [`set_children`](Self::set_children).
    pub fn enter_child(&mut self, index: usize) {
        let step = self
            .levels
            .last()
            .and_then(|level| level.children.get(index))
            .cloned()
            .unwrap_or_default();
        self.levels.push(Level {
            step,
            children: Vec::new(),
        });
    }

    /// Descend into an attribute of the current element.
    pub fn enter_attribute(&mut self, name: &QName) {
        let step = format!("@{}", self.render_name(name));
        self.levels.push(Level {
            step,
            children: Vec::new(),
        });
    }

    /// Return to the parent position.
    pub fn leave(&mut self) {
        if self.levels.len() > 1 {
            self.levels.pop();
        }
    }

    /// Location of the node currently visited.
    pub fn current_path(&self) -> String {
        render(&self.levels)
    }

    /// Location of the parent of the node currently visited.
    pub fn parent_path(&self) -> String {
        let end = self.levels.len().saturating_sub(1).max(1);
        render(&self.levels[..end])
    }

    /// Location a child at `index` of the current node would have.
    pub fn child_path(&self, index: usize) -> String {
        let mut path = self.current_path();
        let step = self
            .levels
            .last()
            .and_then(|level| level.children.get(index));
        if let Some(step) = step {
            if !path.ends_with('/') {
                path.push('/');
            }
            path.push_str(step);
        }
        path
    }

    /// Counter key and rendered step without index. Documents have neither.
    fn step_base(&self, node: &XmlNode) -> (Option<String>, String) {
        match node.kind {
            NodeKind::Document => (None, String::new()),
            NodeKind::Element => {
                let rendered = node
                    .name
                    .as_ref()
                    .map(|name| self.render_name(name))
                    .unwrap_or_default();
                let key = node
                    .name
                    .as_ref()
                    .map(|name| {
                        format!("{{{}}}{}", name.namespace.as_deref().unwrap_or(""), name.local)
                    })
                    .unwrap_or_default();
                (Some(key), rendered)
            }
            NodeKind::Text | NodeKind::CData => {
                (Some("text()".to_string()), "text()".to_string())
            }
            NodeKind::Comment => (Some("comment()".to_string()), "comment()".to_string()),
            NodeKind::ProcessingInstruction => (
                Some("processing-instruction()".to_string()),
                "processing-instruction()".to_string(),
            ),
            NodeKind::DocumentType => (Some("doctype()".to_string()), "doctype()".to_string()),
        }
    }

    fn render_name(&self, name: &QName) -> String {
        let prefix = name
            .namespace
            .as_ref()
            .and_then(|uri| self.prefixes.get(uri));
        match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", name.local),
            _ => name.local.clone(),
        }
    }
}

fn render(levels: &[Level]) -> String {
    let steps: Vec<&str> = levels
        .iter()
        .skip(1)
        .map(|level| level.step.as_str())
        .filter(|step| !step.is_empty())
        .collect();
    format!("/{}", steps.join("/"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::PositionTracker;
    use crate::tree::{QName, XmlNode};

    #[test]
    fn sibling_indices_are_counted_per_name_and_kind() {
        let root = XmlNode::new("root");
        let children = [
            XmlNode::new("a"),
            XmlNode::text("t"),
            XmlNode::new("b"),
            XmlNode::new("a"),
            XmlNode::comment("c"),
            XmlNode::cdata("d"),
        ];
        let refs: Vec<&XmlNode> = children.iter().collect();

        let mut tracker = PositionTracker::for_root(&root, &BTreeMap::new());
        tracker.set_children(&refs);

        let paths: Vec<String> = (0..refs.len()).map(|i| tracker.child_path(i)).collect();
        assert_eq!(
            paths,
            vec![
                "/root[1]/a[1]",
                "/root[1]/text()[1]",
                "/root[1]/b[1]",
                "/root[1]/a[2]",
                "/root[1]/comment()[1]",
                "/root[1]/text()[2]",
            ]
        );
    }

    #[test]
    fn enter_and_leave_keep_push_pop_discipline() {
        let doc = XmlNode::document();
        let root = XmlNode::new("root");
        let mut tracker = PositionTracker::for_root(&doc, &BTreeMap::new());
        assert_eq!(tracker.current_path(), "/");

        tracker.set_children(&[&root]);
        tracker.enter_child(0);
        tracker.enter_attribute(&QName::local("id"));
        assert_eq!(tracker.current_path(), "/root[1]/@id");
        assert_eq!(tracker.parent_path(), "/root[1]");

        tracker.leave();
        tracker.leave();
        assert_eq!(tracker.current_path(), "/");
    }

    #[test]
    fn namespace_context_supplies_prefixes() {
        let mut namespaces = BTreeMap::new();
        namespaces.insert("x".to_string(), "urn:x".to_string());
        let root = XmlNode::element(QName::namespaced("root", "urn:x", Some("ignored")));

        let tracker = PositionTracker::for_root(&root, &namespaces);
        assert_eq!(tracker.current_path(), "/x:root[1]");
    }
}
