use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE parties (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL UNIQUE,
                admin_user_id   INTEGER
            );

            CREATE UNIQUE INDEX idx_parties_admin
                ON parties(admin_user_id) WHERE admin_user_id IS NOT NULL;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                party_id    INTEGER NOT NULL DEFAULT 1 REFERENCES parties(id)
            );

            CREATE TABLE userinfo (
                user_id     INTEGER PRIMARY KEY REFERENCES users(id),
                first_name  TEXT NOT NULL,
                last_name   TEXT NOT NULL
            );

            CREATE TABLE posters (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                party_id    INTEGER NOT NULL REFERENCES parties(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                lat         REAL NOT NULL,
                lng         REAL NOT NULL,
                created     INTEGER NOT NULL,
                updated     INTEGER NOT NULL,
                removed     INTEGER,
                removed_by  INTEGER REFERENCES users(id)
            );

            CREATE INDEX idx_posters_party_updated ON posters(party_id, updated);
            CREATE INDEX idx_posters_user ON posters(user_id);

            CREATE TABLE join_requests (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                party_id    INTEGER NOT NULL REFERENCES parties(id),
                reviewed    INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_join_requests_party ON join_requests(party_id, reviewed);
            CREATE UNIQUE INDEX idx_join_requests_pending
                ON join_requests(user_id) WHERE reviewed = 0;

            CREATE TABLE elections (
                party_id    INTEGER PRIMARY KEY REFERENCES parties(id),
                start_date  INTEGER NOT NULL,
                end_date    INTEGER NOT NULL,
                CHECK (start_date < end_date)
            );

            -- Seed the unaffiliated bucket
            INSERT INTO parties (id, name, admin_user_id) VALUES (1, 'unaffiliated', NULL);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
