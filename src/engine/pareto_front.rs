use std::slice::Iter as SliceIter;

/// Provides the partial order between criteria of a pareto front.
pub(crate) trait DominanceContext {
    type Criteria: Clone;

    /// `true` when `lower` dominates or equals `upper` : a journey with
    /// criteria `lower` makes any journey with criteria `upper` useless.
    fn is_lower(&self, lower: &Self::Criteria, upper: &Self::Criteria) -> bool;
}

/// A set of elements, none of which dominates another.
pub(crate) struct ParetoFront<Id, Ctx: DominanceContext> {
    elements: Vec<(Id, Ctx::Criteria)>,
}

impl<Id: Clone, Ctx: DominanceContext> Clone for ParetoFront<Id, Ctx> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
        }
    }
}

impl<Id: Clone, Ctx: DominanceContext> ParetoFront<Id, Ctx> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn dominates(&self, criteria: &Ctx::Criteria, ctx: &Ctx) -> bool {
        self.elements
            .iter()
            .any(|(_, old_criteria)| ctx.is_lower(old_criteria, criteria))
    }

    pub fn add_unchecked(&mut self, id: Id, criteria: Ctx::Criteria) {
        self.elements.push((id, criteria));
    }

    pub fn remove_elements_dominated_by(&mut self, criteria: &Ctx::Criteria, ctx: &Ctx) {
        self.elements
            .retain(|(_, old_criteria)| !ctx.is_lower(criteria, old_criteria));
    }

    /// To be used when the caller already knows that `criteria` is not
    /// dominated by any element of the front.
    pub fn add_and_remove_elements_dominated(
        &mut self,
        id: Id,
        criteria: Ctx::Criteria,
        ctx: &Ctx,
    ) {
        self.remove_elements_dominated_by(&criteria, ctx);
        self.add_unchecked(id, criteria);
    }

    pub fn add(&mut self, id: Id, criteria: Ctx::Criteria, ctx: &Ctx) {
        if self.dominates(&criteria, ctx) {
            return;
        }
        self.add_and_remove_elements_dominated(id, criteria, ctx);
    }

    /// Swap the content of `self` and `other`, then clear `other`.
    pub fn replace_with(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.elements, &mut other.elements);
        other.elements.clear();
    }

    pub fn iter(&self) -> SliceIter<'_, (Id, Ctx::Criteria)> {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoCriteria;

    impl DominanceContext for TwoCriteria {
        type Criteria = (u32, u32);

        fn is_lower(&self, lower: &(u32, u32), upper: &(u32, u32)) -> bool {
            lower.0 <= upper.0 && lower.1 <= upper.1
        }
    }

    #[test]
    fn add_keeps_only_non_dominated_elements() {
        let ctx = TwoCriteria;
        let mut front: ParetoFront<&str, TwoCriteria> = ParetoFront::new();
        front.add("a", (10, 2), &ctx);
        front.add("b", (5, 5), &ctx);
        assert_eq!(front.len(), 2);

        // dominated by "b"
        front.add("c", (6, 6), &ctx);
        assert_eq!(front.len(), 2);

        // dominates both
        front.add("d", (4, 1), &ctx);
        assert_eq!(front.len(), 1);
        assert_eq!(front.iter().next().map(|(id, _)| *id), Some("d"));
    }

    #[test]
    fn dominates_uses_the_partial_order() {
        let ctx = TwoCriteria;
        let mut front: ParetoFront<&str, TwoCriteria> = ParetoFront::new();
        front.add("a", (5, 5), &ctx);
        assert!(front.dominates(&(5, 5), &ctx));
        assert!(front.dominates(&(7, 6), &ctx));
        assert!(!front.dominates(&(4, 6), &ctx));
    }
}
