use super::{Cents, Movement};

/// Compute a user's balance from their movement history.
/// Deposits and incoming transfer legs add, withdrawals and outgoing legs
/// subtract, all in exact integer cents. The fold is order-independent.
pub fn compute_balance(movements: &[Movement]) -> Cents {
    movements
        .iter()
        .fold(0, |balance, movement| balance + movement.signed_effect())
}

/// Journal-wide invariant checks, recomputed from scratch on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub user_count: i64,
    pub movement_count: i64,
    /// True when the sequence column has holes between its min and max.
    pub has_sequence_gaps: bool,
    /// Movements whose owner or counterparty does not exist.
    pub unknown_user_refs: i64,
    /// Movements recorded with a zero amount; the engine never writes one.
    pub zero_amounts: i64,
    /// Sum of every transfer leg. Paired legs cancel, so a nonzero total
    /// means a leg went missing.
    pub transfer_sum_cents: Cents,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        !self.has_sequence_gaps
            && self.unknown_user_refs == 0
            && self.zero_amounts == 0
            && self.transfer_sum_cents == 0
    }
}
