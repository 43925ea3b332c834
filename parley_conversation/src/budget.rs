//! Turn budget tracking.
//!
//! The budget counts completed exchanges and is configured independently of
//! the memory window: a long dialogue can still replay only a short history.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnBudget {
    budget: usize,
    completed: usize,
}

impl TurnBudget {
    /// Create a tracker. A zero budget is raised to one.
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
            completed: 0,
        }
    }

    pub const fn record_turn(&mut self) {
        self.completed += 1;
    }

    #[must_use]
    pub const fn is_budget_exhausted(&self) -> bool {
        self.completed >= self.budget
    }

    pub const fn reset(&mut self) {
        self.completed = 0;
    }

    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub const fn budget(&self) -> usize {
        self.budget
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_after_budget_turns() {
        let mut budget = TurnBudget::new(3);
        for expected_remaining in [3, 2, 1] {
            assert!(!budget.is_budget_exhausted());
            assert_eq!(budget.remaining(), expected_remaining);
            budget.record_turn();
        }
        assert!(budget.is_budget_exhausted());
        assert_eq!(budget.completed(), 3);
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_reset_zeroes_counter() {
        let mut budget = TurnBudget::new(1);
        budget.record_turn();
        assert!(budget.is_budget_exhausted());

        budget.reset();
        assert_eq!(budget.completed(), 0);
        assert!(!budget.is_budget_exhausted());
    }

    #[test]
    fn test_zero_budget_is_raised_to_one() {
        assert_eq!(TurnBudget::new(0).budget(), 1);
    }
}
