/// Generate SQL migrations for the PostgreSQL session store
///
/// These migrations create the table and indexes the Foreman engine needs
/// to persist one session document per owner.
pub fn generate_migrations() -> Vec<(&'static str, &'static str)> {
    vec![
        // Initial migration - Create the session table
        (
            "20260301000000_initial_schema",
            r#"
            -- Create flow sessions table, one row per owner
            CREATE TABLE IF NOT EXISTS flow_sessions (
                owner_id TEXT PRIMARY KEY,
                flow_type TEXT NOT NULL,
                status TEXT NOT NULL,
                version BIGINT NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );

            -- Create index on status for filtering
            CREATE INDEX IF NOT EXISTS idx_flow_sessions_status ON flow_sessions(status);
            "#,
        ),
        // Support an optional storage-hygiene sweep of stale sessions
        (
            "20260302000000_updated_at_index",
            r#"
            -- Add index on updated_at for efficient cleanup of expired rows
            CREATE INDEX IF NOT EXISTS idx_flow_sessions_updated_at ON flow_sessions(updated_at);
            "#,
        ),
    ]
}
