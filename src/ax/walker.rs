use std::collections::VecDeque;

use crate::ax::probe::AttributeProbe;

/// Default depth bound for `descendants`.
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Bounded traversal over a foreign element graph.
///
/// Some hosts expose trees that fan out without end (popovers, nested
/// groups), so every walk is capped by depth.
pub struct TreeWalker<'a, P: AttributeProbe> {
    probe: &'a P,
}

impl<'a, P: AttributeProbe> TreeWalker<'a, P> {
    pub fn new(probe: &'a P) -> Self {
        Self { probe }
    }

    /// Breadth-first descendants of `root` down to `max_depth` levels
    /// (direct children are depth 1). Level order; siblings keep the order
    /// the platform returned them in. `root` itself is not included.
    pub fn descendants(&self, root: &P::Element, max_depth: usize) -> Vec<P::Element> {
        let mut found = Vec::new();
        let mut queue: VecDeque<(P::Element, usize)> = VecDeque::new();
        queue.push_back((root.clone(), 0));

        while let Some((element, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            for child in self.children(&element) {
                found.push(child.clone());
                queue.push_back((child, depth + 1));
            }
        }

        found
    }

    /// Single-level expansion. Missing children read as empty.
    pub fn children(&self, element: &P::Element) -> Vec<P::Element> {
        self.probe.children(element).unwrap_or_default()
    }

    /// Up to `levels` ancestors of `element`, nearest first.
    pub fn ancestors(&self, element: &P::Element, levels: usize) -> Vec<P::Element> {
        let mut chain = Vec::with_capacity(levels);
        let mut current = element.clone();

        for _ in 0..levels {
            match self.probe.parent(&current) {
                Some(parent) => {
                    chain.push(parent.clone());
                    current = parent;
                }
                None => break,
            }
        }

        chain
    }
}
