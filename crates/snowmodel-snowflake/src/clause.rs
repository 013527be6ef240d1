//! Pagination clause rendering.
//!
//! Snowflake accepts `LIMIT`, but `OFFSET ... FETCH` is the only form that
//! pages deterministically, and it requires an `ORDER BY`.

/// LIMIT clause; `0` means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limit(pub u64);

/// OFFSET clause; `0` means no offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset(pub u64);

/// A LIMIT/OFFSET pair for one SELECT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Limit,
    pub offset: Offset,
}

impl Pagination {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Limit(limit),
            offset: Offset(offset),
        }
    }

    /// Render the clause.
    ///
    /// When the statement has no ORDER BY, one is synthesized: on
    /// `order_key` if the table has a prioritized primary key, otherwise on
    /// `(SELECT NULL)`.
    pub fn to_sql(&self, has_order_by: bool, order_key: Option<&str>) -> String {
        let mut sql = String::new();

        if !has_order_by {
            match order_key {
                Some(key) => {
                    sql.push_str("ORDER BY ");
                    sql.push_str(key);
                    sql.push(' ');
                }
                None => sql.push_str("ORDER BY (SELECT NULL) "),
            }
        }

        if self.offset.0 > 0 {
            sql.push_str(&format!("OFFSET {} ROWS", self.offset.0));
        }

        if self.limit.0 > 0 {
            if self.offset.0 == 0 {
                sql.push_str("OFFSET 0 ROW");
            }
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", self.limit.0));
        }

        sql
    }
}
