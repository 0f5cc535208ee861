//! End-to-end executor tests.

use std::sync::Arc;

use quarry_cache::CacheManager;
use quarry_common::config::CacheConfig;
use quarry_common::types::{
    BatchId, ColumnId, DatabaseId, PlanId, RowId, SchemaId, TableId, TreeAddress,
};
use quarry_query::{
    AllowAllOracle, DenyAllOracle, MemoryCatalog, Operator, QueryExecutor, QueryPlan,
    QueryPlanPart, RowFilter, StatementKind,
};
use quarry_storage::{ColumnSchema, DataType, TableSchema, Value, ValueComparison};
use quarry_txn::{LockManager, LockRequest, LockTarget, TransactionManager};

const ID: ColumnId = ColumnId::new(1);
const NAME: ColumnId = ColumnId::new(2);

fn tree() -> TreeAddress {
    TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1))
}

fn people_schema() -> TableSchema {
    TableSchema::new(
        tree(),
        "people",
        vec![
            ColumnSchema::new(ID, "id", DataType::Int, false, 0),
            ColumnSchema::new(NAME, "name", DataType::Varchar(20), false, 1),
        ],
    )
}

struct Fixture {
    executor: QueryExecutor,
    locks: Arc<LockManager>,
}

fn fixture(page_size: usize) -> Fixture {
    let locks = Arc::new(LockManager::new());
    let executor = QueryExecutor::new(
        Arc::new(CacheManager::in_memory(CacheConfig::with_page_size(page_size))),
        Arc::clone(&locks),
        Arc::new(TransactionManager::default()),
        Arc::new(AllowAllOracle),
        Arc::new(MemoryCatalog::new()),
    );
    Fixture { executor, locks }
}

fn setup_plan(plan_id: u64, names: &[&str]) -> QueryPlan {
    let mut plan = QueryPlan::new(PlanId::new(plan_id)).with_part(QueryPlanPart::new(
        0,
        StatementKind::CreateTable,
        vec![Operator::CreateTable {
            schema: people_schema(),
        }],
    ));
    for (i, name) in names.iter().enumerate() {
        plan = plan.with_part(QueryPlanPart::new(
            (i + 1) as u32,
            StatementKind::Insert,
            vec![Operator::InsertRow {
                tree: tree(),
                values: vec![Value::Int((i + 1) as i32), Value::Text((*name).to_string())],
            }],
        ));
    }
    plan
}

fn select_plan(plan_id: u64, filter: Option<RowFilter>) -> QueryPlan {
    QueryPlan::new(PlanId::new(plan_id)).with_part(QueryPlanPart::new(
        0,
        StatementKind::Select,
        vec![Operator::TableRead {
            tree: tree(),
            columns: vec![ID, NAME],
            filter,
        }],
    ))
}

#[tokio::test]
async fn test_create_insert_select() {
    let f = fixture(4096);
    let setup = f
        .executor
        .execute_plan(setup_plan(1, &["ada", "grace", "edsger"]), "root", "", 1)
        .await;
    assert!(!setup.has_errors(), "{:?}", setup);
    assert!(setup.messages.iter().any(|m| m.contains("created")));

    let result = f
        .executor
        .execute_plan(select_plan(2, None), "root", "", 1)
        .await;
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.columns, vec![ID, NAME]);
}

#[tokio::test]
async fn test_select_with_filter_dedupes_or() {
    let f = fixture(4096);
    f.executor
        .execute_plan(setup_plan(1, &["ada", "grace", "edsger"]), "root", "", 1)
        .await;

    // id > 1 OR id = 2: row 2 matches both children but appears once.
    let filter = RowFilter::or(
        RowFilter::comparison(ID, ValueComparison::GreaterThan, Value::Int(1)),
        RowFilter::comparison(ID, ValueComparison::Equals, Value::Int(2)),
    );
    let result = f
        .executor
        .execute_plan(select_plan(2, Some(filter)), "root", "", 1)
        .await;
    assert_eq!(result.row_count(), 2);
}

#[tokio::test]
async fn test_scoped_update_via_where() {
    let f = fixture(4096);
    f.executor
        .execute_plan(setup_plan(1, &["ada", "grace"]), "root", "", 1)
        .await;

    let plan = QueryPlan::new(PlanId::new(2)).with_part(QueryPlanPart::new(
        0,
        StatementKind::Update,
        vec![
            Operator::TableRead {
                tree: tree(),
                columns: vec![ID],
                filter: Some(RowFilter::comparison(
                    ID,
                    ValueComparison::Equals,
                    Value::Int(2),
                )),
            },
            Operator::UpdateRows {
                tree: tree(),
                assignments: vec![(NAME, Value::Text("hopper".to_string()))],
                scoped_to_previous: true,
            },
        ],
    ));
    let result = f.executor.execute_plan(plan, "root", "", 1).await;
    assert!(!result.has_errors(), "{:?}", result);
    assert!(result.messages.iter().any(|m| m.contains("1 rows updated")));

    let filter = RowFilter::comparison(NAME, ValueComparison::Equals, Value::Text("hopper".into()));
    let check = f
        .executor
        .execute_plan(select_plan(3, Some(filter)), "root", "", 1)
        .await;
    assert_eq!(check.row_count(), 1);
    assert_eq!(check.rows[0][0], Value::Int(2));
}

#[tokio::test]
async fn test_scoped_delete() {
    let f = fixture(4096);
    f.executor
        .execute_plan(setup_plan(1, &["ada", "grace", "edsger"]), "root", "", 1)
        .await;

    let plan = QueryPlan::new(PlanId::new(2)).with_part(QueryPlanPart::new(
        0,
        StatementKind::Delete,
        vec![
            Operator::TableRead {
                tree: tree(),
                columns: vec![ID],
                filter: Some(RowFilter::comparison(
                    ID,
                    ValueComparison::GreaterThan,
                    Value::Int(1),
                )),
            },
            Operator::DeleteRows {
                tree: tree(),
                scoped_to_previous: true,
            },
        ],
    ));
    let result = f.executor.execute_plan(plan, "root", "", 1).await;
    assert!(result.messages.iter().any(|m| m.contains("2 rows deleted")));

    let remaining = f
        .executor
        .execute_plan(select_plan(3, None), "root", "", 1)
        .await;
    assert_eq!(remaining.row_count(), 1);
}

// The contention scenario: an exclusive table lock held by one batch
// denies a second batch's row-level request; after release the retry
// succeeds.
#[tokio::test]
async fn test_exclusive_table_lock_denies_plan_then_retry() {
    let f = fixture(4096);
    f.executor
        .execute_plan(setup_plan(1, &["ada", "grace", "edsger"]), "root", "", 1)
        .await;

    let holder = BatchId::new(9999);
    f.locks
        .try_lock_batch(holder, &[LockRequest::exclusive(LockTarget::Table(tree()))])
        .unwrap();

    let locked_select = select_plan(2, None)
        .with_lock(LockRequest::shared(LockTarget::Row(tree(), RowId::new(1))));
    let denied = f
        .executor
        .execute_plan(locked_select.clone(), "root", "", 1)
        .await;
    assert!(denied.has_errors());
    assert!(denied.execution_errors[0].contains("could not lock"));
    assert_eq!(denied.row_count(), 0);

    f.locks.release_batch(holder);
    let retried = f.executor.execute_plan(locked_select, "root", "", 1).await;
    assert!(!retried.has_errors(), "{:?}", retried);
    assert_eq!(retried.row_count(), 3);
}

// The forwarding scenario: an update outgrows its page, the row moves,
// and a read by the original row ID still sees the latest value.
#[tokio::test]
async fn test_overflow_update_still_readable_by_id() {
    let f = fixture(256);
    f.executor
        .execute_plan(setup_plan(1, &["ada", "grace", "edsger"]), "root", "", 1)
        .await;

    let grown = "a".repeat(18);
    let plan = QueryPlan::new(PlanId::new(2)).with_part(QueryPlanPart::new(
        0,
        StatementKind::Update,
        vec![
            Operator::TableRead {
                tree: tree(),
                columns: vec![ID],
                filter: Some(RowFilter::comparison(
                    ID,
                    ValueComparison::Equals,
                    Value::Int(1),
                )),
            },
            Operator::UpdateRows {
                tree: tree(),
                assignments: vec![(NAME, Value::Text(grown.clone()))],
                scoped_to_previous: true,
            },
        ],
    ));
    let result = f.executor.execute_plan(plan, "root", "", 1).await;
    assert!(!result.has_errors(), "{:?}", result);

    let filter = RowFilter::comparison(ID, ValueComparison::Equals, Value::Int(1));
    let check = f
        .executor
        .execute_plan(select_plan(3, Some(filter)), "root", "", 1)
        .await;
    assert_eq!(check.row_count(), 1);
    assert_eq!(check.rows[0][1], Value::Text(grown));
}

#[tokio::test]
async fn test_permission_denial_takes_no_locks() {
    let locks = Arc::new(LockManager::new());
    let executor = QueryExecutor::new(
        Arc::new(CacheManager::in_memory(CacheConfig::default())),
        Arc::clone(&locks),
        Arc::new(TransactionManager::default()),
        Arc::new(DenyAllOracle),
        Arc::new(MemoryCatalog::new()),
    );

    let plan = setup_plan(1, &["ada"]).with_lock(LockRequest::exclusive(LockTarget::Table(tree())));
    let result = executor.execute_plan(plan, "mallory", "", 1).await;
    assert!(!result.authentication_errors.is_empty());
    assert_eq!(result.row_count(), 0);
    assert!(!locks.is_locked(LockTarget::Table(tree())));
}
