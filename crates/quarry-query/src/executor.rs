//! The query executor.
//!
//! `execute_plan` runs one plan end to end: permission checks first, then
//! the all-or-nothing lock grant, then the two execution passes (Try,
//! Commit) over every part in declared order, on a blocking worker task
//! so the async caller is never pinned by CPU-bound work. Locks and the
//! transaction batch are released on every exit path.
//!
//! Cancellation is advisory: `cancel_plan` signals the plan's token and
//! removes it from the active set, and the runner observes the token
//! between the two passes, not mid-operator.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use quarry_cache::CacheManager;
use quarry_common::types::PlanId;
use quarry_txn::{LockManager, TransactionManager};

use crate::auth::{AuthorizationOracle, Permission};
use crate::catalog::DatabaseCatalog;
use crate::operator::{Mode, OperatorContext, PartState};
use crate::plan::QueryPlan;
use crate::resultset::{authentication_failure, execution_failure, Resultset, ResultsetBuilder};

/// Runs query plans against the engine's shared state.
///
/// The executor owns nothing global: the cache, lock table, transaction
/// registry, and the two external collaborators are injected, so several
/// executors can share one engine or tests can wire isolated ones.
pub struct QueryExecutor {
    cache: Arc<CacheManager>,
    locks: Arc<LockManager>,
    txns: Arc<TransactionManager>,
    oracle: Arc<dyn AuthorizationOracle>,
    catalog: Arc<dyn DatabaseCatalog>,
    active: Arc<Mutex<HashMap<PlanId, CancellationToken>>>,
}

impl QueryExecutor {
    /// Creates an executor over the given engine state.
    #[must_use]
    pub fn new(
        cache: Arc<CacheManager>,
        locks: Arc<LockManager>,
        txns: Arc<TransactionManager>,
        oracle: Arc<dyn AuthorizationOracle>,
        catalog: Arc<dyn DatabaseCatalog>,
    ) -> Self {
        Self {
            cache,
            locks,
            txns,
            oracle,
            catalog,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cache this executor runs against.
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Returns the catalog this executor runs against.
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn DatabaseCatalog> {
        &self.catalog
    }

    /// Runs a plan end to end and returns its result.
    ///
    /// Never returns `Err`: every failure mode is reported through the
    /// result's error fields and callers treat an error-bearing result as
    /// a no-op.
    pub async fn execute_plan(
        &self,
        plan: QueryPlan,
        user: &str,
        password: &str,
        session_id: u64,
    ) -> Resultset {
        tracing::info!(plan = %plan.id, user, session_id, "plan execution started");

        if let Err(denied) = self.user_can_run_plan(&plan, user, password) {
            tracing::info!(plan = %plan.id, user, "plan denied by permissions");
            return authentication_failure(denied);
        }

        let batch_id = match self.txns.begin_batch(plan.id, user) {
            Ok(batch_id) => batch_id,
            Err(err) => return execution_failure(err.to_string()),
        };

        if let Err(conflict) = self.locks.try_lock_batch(batch_id, &plan.lock_requests) {
            if let Err(err) = self.txns.end_batch(batch_id) {
                tracing::warn!(batch = %batch_id, error = %err, "orphaned batch on lock denial");
            }
            return execution_failure(format!("could not lock plan objects: {conflict}"));
        }

        let token = CancellationToken::new();
        let plan_id = plan.id;
        self.active.lock().insert(plan_id, token.clone());

        let cache = Arc::clone(&self.cache);
        let catalog = Arc::clone(&self.catalog);
        let result = tokio::task::spawn_blocking(move || {
            run_plan_body(&cache, catalog.as_ref(), &plan, &token)
        })
        .await
        .unwrap_or_else(|join_err| {
            execution_failure(format!("plan execution aborted: {join_err}"))
        });

        self.active.lock().remove(&plan_id);
        self.locks.release_batch(batch_id);
        if let Err(err) = self.txns.end_batch(batch_id) {
            tracing::warn!(batch = %batch_id, error = %err, "batch already ended");
        }

        tracing::info!(
            plan = %plan_id,
            rows = result.row_count(),
            errors = result.has_errors(),
            "plan execution finished"
        );
        result
    }

    /// Signals a plan's cancellation token and removes it from the
    /// active set. Returns true if the plan was active.
    ///
    /// Advisory: an in-flight pass is not interrupted, but the runner
    /// will not start its Commit pass after the signal.
    pub fn cancel_plan(&self, plan_id: PlanId) -> bool {
        match self.active.lock().remove(&plan_id) {
            Some(token) => {
                token.cancel();
                tracing::info!(plan = %plan_id, "plan cancelled");
                true
            }
            None => false,
        }
    }

    /// Returns the IDs of the currently active plans.
    #[must_use]
    pub fn active_plans(&self) -> Vec<PlanId> {
        self.active.lock().keys().copied().collect()
    }

    /// Checks every operator's permission before anything else runs.
    ///
    /// System-level full access short-circuits; otherwise each operator
    /// needs its own permission on its database. Any failure aborts the
    /// plan before a single lock is taken.
    fn user_can_run_plan(
        &self,
        plan: &QueryPlan,
        user: &str,
        password: &str,
    ) -> Result<(), String> {
        if self
            .oracle
            .user_has_system_permission(user, Permission::FullAccess)
        {
            return Ok(());
        }
        for part in &plan.parts {
            for operator in &part.operators {
                let permission = operator.required_permission();
                let database_id = operator.database_id();
                if !self
                    .oracle
                    .user_has_db_permission(user, password, database_id, permission)
                {
                    return Err(format!(
                        "user '{user}' lacks {permission} on database {database_id}"
                    ));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("active_plans", &self.active.lock().len())
            .finish_non_exhaustive()
    }
}

/// The synchronous plan body: two passes over every part in order.
fn run_plan_body(
    cache: &CacheManager,
    catalog: &dyn DatabaseCatalog,
    plan: &QueryPlan,
    token: &CancellationToken,
) -> Resultset {
    let ctx = OperatorContext { cache, catalog };
    let parts = plan.sorted_parts();
    let mut states: Vec<PartState> = parts.iter().map(|_| PartState::default()).collect();
    let mut builder = ResultsetBuilder::new();

    for mode in [Mode::Try, Mode::Commit] {
        if mode == Mode::Commit && token.is_cancelled() {
            builder.add_execution_error(format!("plan {} cancelled before commit", plan.id));
            return builder.build();
        }
        for (part_index, part) in parts.iter().enumerate() {
            for (op_index, operator) in part.operators.iter().enumerate() {
                if let Err(err) =
                    operator.execute(op_index, mode, &ctx, &mut states[part_index], &mut builder)
                {
                    tracing::warn!(
                        plan = %plan.id,
                        part = part.order,
                        operator = op_index,
                        error = %err,
                        "operator failed"
                    );
                    builder.add_execution_error(err.to_string());
                    return builder.build();
                }
            }
        }
    }

    builder.build()
}
