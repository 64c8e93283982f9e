use serde_json::{Value, json};

/// Best-effort RPC run before the first insert; creates the primary table
/// when the backend exposes it.
pub const ENSURE_TABLE_RPC: &str = "create_waitlist_table_if_not_exists";

/// The only table `ENSURE_TABLE_RPC` knows how to create.
pub const ENSURE_TABLE_TARGET: &str = "waitlist";

/// Generic SQL RPC used to create the primary table on demand.
pub const EXEC_SQL_RPC: &str = "exec_sql";

/// An RPC call that makes a missing insert target exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Provisioner {
    pub function: &'static str,
    pub args: Value,
}

impl Provisioner {
    pub fn create_table(table: &str) -> Self {
        Self {
            function: EXEC_SQL_RPC,
            args: json!({ "sql": create_table_sql(table) }),
        }
    }
}

/// DDL for a waitlist table open to anonymous inserts and selects.
///
/// `table` must already be a validated identifier.
pub fn create_table_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id SERIAL PRIMARY KEY,
    email VARCHAR(255) UNIQUE NOT NULL,
    created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
);

ALTER TABLE {table} ENABLE ROW LEVEL SECURITY;

DROP POLICY IF EXISTS "Allow public inserts" ON {table};
CREATE POLICY "Allow public inserts" ON {table}
    FOR INSERT WITH CHECK (true);

DROP POLICY IF EXISTS "Allow public selects" ON {table};
CREATE POLICY "Allow public selects" ON {table}
    FOR SELECT USING (true);
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_targets_given_table() {
        let sql = create_table_sql("waitlist");
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS waitlist ("));
        assert!(sql.contains("email VARCHAR(255) UNIQUE NOT NULL"));
        assert!(sql.contains("ALTER TABLE waitlist ENABLE ROW LEVEL SECURITY"));
        assert!(!sql.contains("users"));
    }

    #[test]
    fn provisioner_wraps_ddl_in_exec_sql() {
        let provisioner = Provisioner::create_table("signups");
        assert_eq!(provisioner.function, EXEC_SQL_RPC);
        let sql = provisioner.args["sql"].as_str().unwrap();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS signups"));
    }
}
