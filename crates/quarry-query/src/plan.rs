//! Executable query plans.
//!
//! A plan arrives fully populated (SQL parsing is out of scope): an
//! ordered list of parts, one per DDL/DML unit, each holding an ordered
//! operator sequence, plus the lock requests the whole plan needs. Plans
//! are immutable once built; the executor sorts parts by their declared
//! order before running them.

use quarry_common::types::PlanId;
use quarry_txn::LockRequest;

use crate::operator::Operator;

/// The kind of statement a plan part implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT.
    Select,
    /// INSERT.
    Insert,
    /// UPDATE.
    Update,
    /// DELETE.
    Delete,
    /// CREATE TABLE.
    CreateTable,
    /// CREATE SCHEMA.
    CreateSchema,
    /// Storage policy change.
    SetStoragePolicy,
}

/// One DDL/DML unit of a plan.
///
/// Operators execute in sequence order. A write operator with its
/// `scoped_to_previous` flag set consumes the row addresses produced by
/// the most recent read operator in the same part.
#[derive(Debug, Clone)]
pub struct QueryPlanPart {
    /// Execution order among the plan's parts.
    pub order: u32,
    /// The statement this part implements.
    pub statement: StatementKind,
    /// The operator sequence.
    pub operators: Vec<Operator>,
}

impl QueryPlanPart {
    /// Creates a plan part.
    #[must_use]
    pub fn new(order: u32, statement: StatementKind, operators: Vec<Operator>) -> Self {
        Self {
            order,
            statement,
            operators,
        }
    }
}

/// The ordered, executable representation of one statement batch.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// The plan's ID, unique among in-flight plans.
    pub id: PlanId,
    /// The plan's parts, not necessarily in execution order.
    pub parts: Vec<QueryPlanPart>,
    /// Every lock the plan needs, granted all-or-nothing before any
    /// operator runs.
    pub lock_requests: Vec<LockRequest>,
}

impl QueryPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new(id: PlanId) -> Self {
        Self {
            id,
            parts: Vec::new(),
            lock_requests: Vec::new(),
        }
    }

    /// Adds a part.
    #[must_use]
    pub fn with_part(mut self, part: QueryPlanPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Adds a lock request.
    #[must_use]
    pub fn with_lock(mut self, request: LockRequest) -> Self {
        self.lock_requests.push(request);
        self
    }

    /// Returns the parts in execution order.
    #[must_use]
    pub fn sorted_parts(&self) -> Vec<&QueryPlanPart> {
        let mut parts: Vec<&QueryPlanPart> = self.parts.iter().collect();
        parts.sort_by_key(|p| p.order);
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_sorted_by_order() {
        let plan = QueryPlan::new(PlanId::new(1))
            .with_part(QueryPlanPart::new(2, StatementKind::Select, vec![]))
            .with_part(QueryPlanPart::new(1, StatementKind::Insert, vec![]));
        let orders: Vec<u32> = plan.sorted_parts().iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }
}
