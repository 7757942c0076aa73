//! State-mutation tracking
//!
//! The flag only ever goes from false to true within a unit. Nested units
//! (one SQL statement inside an action or procedure) are measured by
//! suspending the outer state and folding the nested result back in.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MutationTracker {
    mutative: bool,
}

impl MutationTracker {
    pub fn mark(&mut self) {
        self.mutative = true;
    }

    pub fn is_mutative(&self) -> bool {
        self.mutative
    }

    /// Start measuring a nested unit; keep the returned state for [`Self::resume`]
    pub fn suspend(&mut self) -> MutationTracker {
        std::mem::take(self)
    }

    /// Finish a nested unit. Returns whether the nested unit mutated.
    pub fn resume(&mut self, outer: MutationTracker) -> bool {
        let nested = self.mutative;
        self.mutative |= outer.mutative;
        nested
    }
}
