//! Child pairing policies: which control child is compared with which test child.

use std::sync::Arc;

use crate::diff::selector::{ByName, ElementSelector};
use crate::tree::{NodeKind, XmlNode};

/// Result of pairing two child lists; all values are indices into the given lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    /// Matched pairs in control order.
    pub pairs: Vec<(usize, usize)>,
    /// Control children without test counterpart.
    pub unmatched_control: Vec<usize>,
    /// Test children without control counterpart.
    pub unmatched_test: Vec<usize>,
}

/// Strategy producing a [`Pairing`] for two child lists.
pub trait NodeMatcher: Send + Sync {
    fn match_nodes(&self, control: &[&XmlNode], test: &[&XmlNode]) -> Pairing;
}

/// Pairs children with the same index; trailing children of the longer list are residuals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalMatcher;

impl NodeMatcher for PositionalMatcher {
    fn match_nodes(&self, control: &[&XmlNode], test: &[&XmlNode]) -> Pairing {
        let common = control.len().min(test.len());
        Pairing {
            pairs: (0..common).map(|idx| (idx, idx)).collect(),
            unmatched_control: (common..control.len()).collect(),
            unmatched_test: (common..test.len()).collect(),
        }
    }
}

/// Selector-driven pairing.
///
/// Each control child, in order, takes the first not yet consumed test child it is
/// compatible with. Element pairs must also satisfy one of the selectors; selectors are
/// tried in registration order, each over all remaining test children. The result depends
/// on control order by construction: an earlier control child wins an ambiguous test child.
#[derive(Clone)]
pub struct DefaultNodeMatcher {
    selectors: Vec<Arc<dyn ElementSelector>>,
}

impl Default for DefaultNodeMatcher {
    fn default() -> Self {
        Self::new(ByName)
    }
}

impl DefaultNodeMatcher {
    pub fn new<S: ElementSelector + 'static>(selector: S) -> Self {
        Self {
            selectors: vec![Arc::new(selector)],
        }
    }

    /// Add a selector consulted when the previous ones found no partner.
    pub fn then_try<S: ElementSelector + 'static>(mut self, selector: S) -> Self {
        self.selectors.push(Arc::new(selector));
        self
    }

    fn find_partner(
        &self,
        control: &XmlNode,
        test: &[&XmlNode],
        consumed: &[bool],
    ) -> Option<usize> {
        if control.kind == NodeKind::Element {
            return self.selectors.iter().find_map(|selector| {
                first_free(test, consumed, |candidate| {
                    candidate.kind == NodeKind::Element
                        && selector.can_be_compared(control, candidate)
                })
            });
        }
        first_free(test, consumed, |candidate| {
            control.kind.is_compatible_with(candidate.kind)
        })
    }
}

/// First unconsumed index whose node satisfies `accept`.
fn first_free(
    test: &[&XmlNode],
    consumed: &[bool],
    accept: impl Fn(&XmlNode) -> bool,
) -> Option<usize> {
    test.iter()
        .enumerate()
        .find(|(idx, node)| !consumed[*idx] && accept(**node))
        .map(|(idx, _)| idx)
}

impl NodeMatcher for DefaultNodeMatcher {
    fn match_nodes(&self, control: &[&XmlNode], test: &[&XmlNode]) -> Pairing {
        let mut consumed = vec![false; test.len()];
        let mut pairing = Pairing::default();

        for (control_idx, control_node) in control.iter().enumerate() {
            match self.find_partner(control_node, test, &consumed) {
                Some(test_idx) => {
                    consumed[test_idx] = true;
                    pairing.pairs.push((control_idx, test_idx));
                }
                None => pairing.unmatched_control.push(control_idx),
            }
        }
        pairing.unmatched_test = consumed
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(|(idx, _)| idx)
            .collect();
        pairing
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultNodeMatcher, NodeMatcher, Pairing, PositionalMatcher};
    use crate::diff::selector::{by_name_and_attributes, by_name_and_text};
    use crate::tree::XmlNode;

    fn refs(nodes: &[XmlNode]) -> Vec<&XmlNode> {
        nodes.iter().collect()
    }

    #[test]
    fn positional_leaves_trailing_residuals() {
        let control = [XmlNode::new("x"), XmlNode::new("y")];
        let test = [XmlNode::new("x")];

        let pairing = PositionalMatcher.match_nodes(&refs(&control), &refs(&test));
        assert_eq!(
            pairing,
            Pairing {
                pairs: vec![(0, 0)],
                unmatched_control: vec![1],
                unmatched_test: vec![],
            }
        );
    }

    #[test]
    fn selector_matching_consumes_test_children_once() {
        let control = [XmlNode::new("a"), XmlNode::new("a"), XmlNode::new("b")];
        let test = [XmlNode::new("b"), XmlNode::new("a"), XmlNode::new("c")];

        let pairing = DefaultNodeMatcher::default().match_nodes(&refs(&control), &refs(&test));
        assert_eq!(pairing.pairs, vec![(0, 1), (2, 0)]);
        assert_eq!(pairing.unmatched_control, vec![1]);
        assert_eq!(pairing.unmatched_test, vec![2]);
    }

    #[test]
    fn first_match_in_control_order_wins_ambiguous_candidates() {
        // Every control item accepts every test item; control order decides.
        let control = [
            XmlNode::new("item").with_attribute("k", "1"),
            XmlNode::new("item").with_attribute("k", "1").with_attribute("v", "x"),
        ];
        let test = [
            XmlNode::new("item").with_attribute("k", "1").with_attribute("v", "x"),
            XmlNode::new("item").with_attribute("k", "1"),
        ];

        let matcher = DefaultNodeMatcher::new(by_name_and_attributes(&["k"]));
        let pairing = matcher.match_nodes(&refs(&control), &refs(&test));
        assert_eq!(pairing.pairs, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn later_selectors_are_fallbacks() {
        let control = [XmlNode::new("a").with_text("1")];
        let test = [XmlNode::new("a").with_text("2")];

        let strict = DefaultNodeMatcher::new(by_name_and_text());
        assert!(strict.match_nodes(&refs(&control), &refs(&test)).pairs.is_empty());

        let fallback = strict.then_try(super::ByName);
        assert_eq!(
            fallback.match_nodes(&refs(&control), &refs(&test)).pairs,
            vec![(0, 0)]
        );
    }

    #[test]
    fn character_data_pairs_with_text_or_cdata() {
        let control = [XmlNode::comment("c"), XmlNode::text("t")];
        let test = [XmlNode::cdata("t"), XmlNode::comment("c")];

        let pairing = DefaultNodeMatcher::default().match_nodes(&refs(&control), &refs(&test));
        assert_eq!(pairing.pairs, vec![(0, 1), (1, 0)]);
    }
}
