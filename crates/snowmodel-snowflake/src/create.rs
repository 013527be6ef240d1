//! The create pipeline: resolve, render, execute, recover, match.

use snowmodel_core::{Connection, Cx, Error, Model, Outcome};

use crate::config::SnowflakeConfig;
use crate::conflict::{ConflictResolver, ConflictSpec, Downgrade, WritePath};
use crate::executor::Executor;
use crate::matcher::{RowMatcher, Shape};
use crate::matrix::{TableSchema, ValueMatrix};
use crate::naming::NamingStrategy;
use crate::recover::{GeneratedValueRecoverer, Recovery};
use crate::statement::StatementBuilder;

/// Result of a successful write.
///
/// Failures before or during the write are returned as errors instead;
/// everything after the write is described here.
#[derive(Debug)]
pub struct CreateReport {
    /// Rows the warehouse reported as affected by the write
    pub rows_affected: u64,
    /// Statement family that was executed
    pub path: WritePath,
    /// Set when a requested upsert ran as a plain insert
    pub downgrade: Option<Downgrade>,
    pub recovery: Recovery,
}

impl CreateReport {
    fn empty() -> Self {
        Self {
            rows_affected: 0,
            path: WritePath::PlainInsert,
            downgrade: None,
            recovery: Recovery::NotRequired,
        }
    }
}

/// Strategy used to create rows for models.
pub trait WriteStrategy: Send + Sync {
    /// Insert or upsert one object, filling in its generated values.
    fn create<C: Connection, M: Model>(
        &self,
        cx: &Cx,
        conn: &mut C,
        target: &mut M,
        conflict: Option<&ConflictSpec>,
    ) -> impl Future<Output = Outcome<CreateReport, Error>> + Send;

    /// Insert or upsert a collection in one statement, filling in generated
    /// values in order.
    fn create_many<C: Connection, M: Model>(
        &self,
        cx: &Cx,
        conn: &mut C,
        targets: &mut [M],
        conflict: Option<&ConflictSpec>,
    ) -> impl Future<Output = Outcome<CreateReport, Error>> + Send;
}

/// Snowflake create strategy.
///
/// Upserts become `MERGE` statements and generated values are read back
/// from the table's change log.
#[derive(Debug, Clone, Default)]
pub struct SnowflakeCreate {
    config: SnowflakeConfig,
    naming: NamingStrategy,
}

impl SnowflakeCreate {
    pub fn new(config: SnowflakeConfig, naming: NamingStrategy) -> Self {
        Self { config, naming }
    }

    pub fn config(&self) -> &SnowflakeConfig {
        &self.config
    }

    #[tracing::instrument(
        level = "debug",
        skip(self, cx, conn, targets, conflict),
        fields(table = M::TABLE_NAME, targets = targets.len())
    )]
    async fn run<C: Connection, M: Model>(
        &self,
        cx: &Cx,
        conn: &mut C,
        targets: &mut [M],
        conflict: Option<&ConflictSpec>,
        shape: Shape,
    ) -> Outcome<CreateReport, Error> {
        if targets.is_empty() {
            tracing::debug!("Nothing to create");
            return Outcome::Ok(CreateReport::empty());
        }

        let schema = TableSchema::of::<M>(&self.naming);
        let matrix = match ValueMatrix::from_models(&schema, targets) {
            Ok(matrix) => matrix,
            Err(e) => return Outcome::Err(e),
        };

        let resolution = match ConflictResolver::new(&schema)
            .strict(self.config.strict_upsert)
            .resolve(conflict, &matrix)
        {
            Ok(resolution) => resolution,
            Err(e) => return Outcome::Err(e),
        };

        let statement = match StatementBuilder::new(&schema).build(&matrix, &resolution) {
            Ok(statement) => statement,
            Err(e) => return Outcome::Err(e),
        };
        tracing::debug!(
            path = %resolution.path,
            columns = matrix.width(),
            rows = matrix.len(),
            "Write resolved"
        );

        let receipt = match Executor::new(conn)
            .execute(cx, schema.table(), resolution.path, &statement)
            .await
        {
            Outcome::Ok(receipt) => receipt,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        let rows_affected = receipt.rows_affected();
        let report = |recovery: Recovery| CreateReport {
            rows_affected,
            path: resolution.path,
            downgrade: resolution.downgrade.clone(),
            recovery,
        };

        let generated = schema.generated();
        if generated.is_empty() || !self.config.recover_generated {
            receipt.finish();
            return Outcome::Ok(report(Recovery::NotRequired));
        }

        let recoverer =
            GeneratedValueRecoverer::new(&schema).plain_insert_mode(self.config.plain_insert_changes);
        let mut cursor = match recoverer.open(cx, receipt, &generated).await {
            Outcome::Ok(cursor) => cursor,
            Outcome::Err(error) => {
                return Outcome::Ok(report(Recovery::Failed { rows: 0, error }));
            }
            Outcome::Cancelled(_) => {
                return Outcome::Ok(report(Recovery::Interrupted { rows: 0 }));
            }
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        let recovery = match RowMatcher::new(&schema, resolution.path)
            .bind(cx, &mut cursor, targets, &generated, shape)
            .await
        {
            Outcome::Ok(recovery) => recovery,
            Outcome::Err(error) => Recovery::Failed { rows: 0, error },
            Outcome::Cancelled(_) => Recovery::Interrupted { rows: 0 },
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        cursor.close();

        Outcome::Ok(report(recovery))
    }
}

impl WriteStrategy for SnowflakeCreate {
    async fn create<C: Connection, M: Model>(
        &self,
        cx: &Cx,
        conn: &mut C,
        target: &mut M,
        conflict: Option<&ConflictSpec>,
    ) -> Outcome<CreateReport, Error> {
        self.run(cx, conn, std::slice::from_mut(target), conflict, Shape::Single)
            .await
    }

    async fn create_many<C: Connection, M: Model>(
        &self,
        cx: &Cx,
        conn: &mut C,
        targets: &mut [M],
        conflict: Option<&ConflictSpec>,
    ) -> Outcome<CreateReport, Error> {
        self.run(cx, conn, targets, conflict, Shape::Collection).await
    }
}
