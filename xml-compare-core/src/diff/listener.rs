//! Observers notified about comparisons, and controllers that may halt a run.

use crate::diff::comparison::{Comparison, ComparisonResult};

/// Receives every comparison it is registered for, with the reported outcome.
///
/// Panics raised by listeners are not caught by the engine.
pub trait ComparisonListener {
    fn comparison_performed(&mut self, comparison: &Comparison<'_>, outcome: ComparisonResult);
}

impl<F> ComparisonListener for F
where
    F: FnMut(&Comparison<'_>, ComparisonResult),
{
    fn comparison_performed(&mut self, comparison: &Comparison<'_>, outcome: ComparisonResult) {
        self(comparison, outcome)
    }
}

/// Registered listeners, invoked in registration order.
#[derive(Default)]
pub struct Listeners {
    all: Vec<Box<dyn ComparisonListener>>,
    differences: Vec<Box<dyn ComparisonListener>>,
    matches: Vec<Box<dyn ComparisonListener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every comparison.
    pub fn add_comparison_listener<L: ComparisonListener + 'static>(&mut self, listener: L) {
        self.all.push(Box::new(listener));
    }

    /// Called for comparisons whose outcome is not `Equal`.
    pub fn add_difference_listener<L: ComparisonListener + 'static>(&mut self, listener: L) {
        self.differences.push(Box::new(listener));
    }

    /// Called for comparisons whose outcome is `Equal`.
    pub fn add_match_listener<L: ComparisonListener + 'static>(&mut self, listener: L) {
        self.matches.push(Box::new(listener));
    }

    /// Notify listeners; `outcome` is collapsed with [`ComparisonResult::reported`] first.
    pub fn dispatch(&mut self, comparison: &Comparison<'_>, outcome: ComparisonResult) {
        let outcome = outcome.reported();
        for listener in &mut self.all {
            listener.comparison_performed(comparison, outcome);
        }
        let targeted = if outcome == ComparisonResult::Equal {
            &mut self.matches
        } else {
            &mut self.differences
        };
        for listener in targeted {
            listener.comparison_performed(comparison, outcome);
        }
    }
}

/// Decides whether the whole traversal should stop after a non-equal comparison.
pub trait ComparisonController: Send + Sync {
    fn stop_diff_analysis(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> bool;
}

/// Never stops; every node pair is visited.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl ComparisonController for NeverStop {
    fn stop_diff_analysis(&self, _: &Comparison<'_>, _: ComparisonResult) -> bool {
        false
    }
}

/// Stops at the first `Different` outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopWhenDifferent;

impl ComparisonController for StopWhenDifferent {
    fn stop_diff_analysis(&self, _: &Comparison<'_>, outcome: ComparisonResult) -> bool {
        outcome.reported() == ComparisonResult::Different
    }
}

/// Stops at the first outcome that is not `Equal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopWhenSimilar;

impl ComparisonController for StopWhenSimilar {
    fn stop_diff_analysis(&self, _: &Comparison<'_>, outcome: ComparisonResult) -> bool {
        outcome != ComparisonResult::Equal
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::Listeners;
    use crate::diff::comparison::{Comparison, ComparisonKind, ComparisonResult, Detail};

    fn comparison() -> Comparison<'static> {
        Comparison::new(
            ComparisonKind::TextValue,
            Detail::new("/a[1]".to_string(), "/".to_string(), None, None),
            Detail::new("/a[1]".to_string(), "/".to_string(), None, None),
        )
    }

    #[test]
    fn dispatch_follows_registration_order_and_filters() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::new();

        let sink = Rc::clone(&log);
        listeners.add_difference_listener(move |_: &Comparison<'_>, r: ComparisonResult| {
            sink.borrow_mut().push(format!("diff:{r}"))
        });
        let sink = Rc::clone(&log);
        listeners.add_comparison_listener(move |_: &Comparison<'_>, r: ComparisonResult| {
            sink.borrow_mut().push(format!("all:{r}"))
        });
        let sink = Rc::clone(&log);
        listeners.add_match_listener(move |_: &Comparison<'_>, r: ComparisonResult| {
            sink.borrow_mut().push(format!("match:{r}"))
        });

        listeners.dispatch(&comparison(), ComparisonResult::Critical);
        listeners.dispatch(&comparison(), ComparisonResult::Equal);

        assert_eq!(
            *log.borrow(),
            vec!["all:DIFFERENT", "diff:DIFFERENT", "all:EQUAL", "match:EQUAL"]
        );
    }
}
