//! Bounded material stacks owned by storage-bearing objects.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::material::{ComponentId, ElementId, Material};

/// Admission predicate evaluated over the incoming material and the current
/// top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionRule {
    Any,
    /// Every stored material equals the first one pushed.
    MatchTop,
    /// Only `component` made of `element`.
    Only {
        element: ElementId,
        component: ComponentId,
    },
}

impl AdmissionRule {
    pub fn admits(&self, incoming: &Material, top: Option<&Material>) -> bool {
        match *self {
            AdmissionRule::Any => true,
            AdmissionRule::MatchTop => top.map_or(true, |top| top == incoming),
            AdmissionRule::Only { element, component } => incoming.is(element, component),
        }
    }
}

/// A stack of at most `capacity` materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    objects: Vec<Material>,
    capacity: usize,
    rule: AdmissionRule,
}

impl Container {
    pub fn new(capacity: usize, rule: AdmissionRule) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            capacity,
            rule,
        }
    }

    /// Whether `material` would be admitted right now.
    pub fn can_store(&self, material: &Material) -> bool {
        !self.is_full() && self.rule.admits(material, self.peek())
    }

    /// Push `material` if [`can_store`](Self::can_store) allows it.
    ///
    /// Returns `false` (and stores nothing) otherwise.
    pub fn push(&mut self, material: Material) -> bool {
        if !self.can_store(&material) {
            trace!(len = self.objects.len(), capacity = self.capacity, "container rejected push");
            return false;
        }
        self.objects.push(material);
        true
    }

    pub fn pop(&mut self) -> Option<Material> {
        self.objects.pop()
    }

    pub fn peek(&self) -> Option<&Material> {
        self.objects.last()
    }

    /// Remove every stored material, returning them bottom first.
    pub fn empty(&mut self) -> Vec<Material> {
        std::mem::take(&mut self.objects)
    }

    pub fn is_full(&self) -> bool {
        self.objects.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn rule(&self) -> AdmissionRule {
        self.rule
    }

    /// Stored materials, bottom first.
    pub fn objects(&self) -> &[Material] {
        &self.objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::catalog::*;
    use crate::material::{MaterialQuery, MaterialRegistry};

    fn first(r: &MaterialRegistry, e: ElementId, c: ComponentId) -> Material {
        r.first_match(&MaterialQuery::new().element(e).component(c))
            .unwrap()
    }

    #[test]
    fn automaton_stack_holds_eight_then_rejects() {
        let r = MaterialRegistry::standard();
        let bar = first(&r, IRON, BAR);
        let mut c = Container::new(8, AdmissionRule::MatchTop);
        for i in 0..8 {
            assert!(c.can_store(&bar), "push {i} should be admitted");
            assert!(c.push(bar));
            assert!(c.len() <= c.capacity());
        }
        assert!(c.is_full());
        assert!(!c.can_store(&bar));
        assert!(!c.push(bar));
        assert_eq!(c.len(), 8);
    }

    #[test]
    fn match_top_rejects_different_material() {
        let r = MaterialRegistry::standard();
        let mut c = Container::new(8, AdmissionRule::MatchTop);
        assert!(c.push(first(&r, IRON, BAR)));
        assert!(!c.push(first(&r, GOLD, BAR)));
        assert!(!c.push(first(&r, IRON, ORE)));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn only_rule_filters_by_element_and_component() {
        let r = MaterialRegistry::standard();
        let mut c = Container::new(
            16,
            AdmissionRule::Only {
                element: GOLD,
                component: BAR,
            },
        );
        assert!(!c.push(first(&r, IRON, BAR)));
        assert!(c.push(first(&r, GOLD, BAR)));
    }

    #[test]
    fn pop_peek_and_empty() {
        let r = MaterialRegistry::standard();
        let mut c = Container::new(4, AdmissionRule::Any);
        let ore = first(&r, IRON, ORE);
        let bar = first(&r, GOLD, BAR);
        c.push(ore);
        c.push(bar);
        assert_eq!(c.peek(), Some(&bar));
        assert_eq!(c.pop(), Some(bar));
        c.push(bar);
        let all = c.empty();
        assert_eq!(all, vec![ore, bar]);
        assert!(c.is_empty());
        assert_eq!(c.pop(), None);
    }
}
