//! SQL query constants
//!
//! Contains all SQL used by the PostgreSQL stores.

/// Advisory lock key serializing every write that can grow the selected set
pub const SELECTION_LOCK_KEY: i64 = 0x5E1E_C7ED;

pub const CREATE_PROPOSALS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS proposals (
        id UUID PRIMARY KEY,
        team_name TEXT NOT NULL UNIQUE,
        students JSONB NOT NULL,
        project_title TEXT NOT NULL,
        project_logo TEXT NOT NULL,
        team_composition TEXT NOT NULL,
        problem_statement TEXT NOT NULL,
        tools_and_methodology TEXT NOT NULL,
        implementation_plan TEXT NOT NULL,
        project_flow_slides TEXT NOT NULL,
        expected_results TEXT NOT NULL,
        additional_details TEXT,
        status TEXT NOT NULL DEFAULT 'submitted'
            CHECK (status IN ('submitted', 'selected', 'rejected')),
        submitted_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

pub const CREATE_PROPOSALS_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_proposals_status ON proposals(status)";

/// Single-row table: the boolean key can only ever be TRUE
pub const CREATE_SETTINGS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        id BOOLEAN PRIMARY KEY DEFAULT TRUE CHECK (id),
        submission_deadline TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

pub const CREATE_ANNOUNCEMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS announcements (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        priority TEXT NOT NULL DEFAULT 'medium'
            CHECK (priority IN ('low', 'medium', 'high')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

const PROPOSAL_COLUMNS: &str = "id, team_name, students, project_title, project_logo, \
    team_composition, problem_statement, tools_and_methodology, implementation_plan, \
    project_flow_slides, expected_results, additional_details, status, submitted_at";

pub fn insert_proposal() -> String {
    format!(
        "INSERT INTO proposals ({cols}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING {cols}",
        cols = PROPOSAL_COLUMNS
    )
}

pub fn select_proposal_by_id() -> String {
    format!("SELECT {} FROM proposals WHERE id = $1", PROPOSAL_COLUMNS)
}

pub fn select_proposal_by_team_name() -> String {
    format!("SELECT {} FROM proposals WHERE team_name = $1", PROPOSAL_COLUMNS)
}

pub fn select_all_proposals() -> String {
    format!(
        "SELECT {} FROM proposals ORDER BY submitted_at DESC",
        PROPOSAL_COLUMNS
    )
}

pub fn select_proposals_by_status() -> String {
    format!(
        "SELECT {} FROM proposals WHERE status = $1 ORDER BY submitted_at ASC LIMIT $2",
        PROPOSAL_COLUMNS
    )
}

/// Applies only while the row still holds the expected status
pub fn update_status_if_unchanged() -> String {
    format!(
        "UPDATE proposals SET status = $3 WHERE id = $1 AND status = $2 RETURNING {}",
        PROPOSAL_COLUMNS
    )
}

pub const LOCK_SELECTION: &str = "SELECT pg_advisory_xact_lock($1)";

pub const SELECT_STATUS_FOR_UPDATE: &str =
    "SELECT status FROM proposals WHERE id = $1 FOR UPDATE";

pub const COUNT_BY_STATUS: &str = "SELECT COUNT(*) FROM proposals WHERE status = $1";

pub const SELECT_EXISTING_IDS: &str = "SELECT id FROM proposals WHERE id = ANY($1)";

pub const RESET_ALL_TO_SUBMITTED: &str =
    "UPDATE proposals SET status = 'submitted' WHERE status <> 'submitted'";

pub const SELECT_IDS: &str = "UPDATE proposals SET status = 'selected' WHERE id = ANY($1)";

pub const SELECT_SETTINGS: &str =
    "SELECT submission_deadline, updated_at FROM settings WHERE id = TRUE";

pub const UPSERT_DEADLINE: &str = r#"
    INSERT INTO settings (id, submission_deadline, updated_at)
    VALUES (TRUE, $1, $2)
    ON CONFLICT (id) DO UPDATE
        SET submission_deadline = EXCLUDED.submission_deadline,
            updated_at = EXCLUDED.updated_at
    RETURNING submission_deadline, updated_at
"#;

pub const INSERT_ANNOUNCEMENT: &str = r#"
    INSERT INTO announcements (id, title, content, priority, created_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, title, content, priority, created_at
"#;

pub const SELECT_ANNOUNCEMENTS: &str =
    "SELECT id, title, content, priority, created_at FROM announcements ORDER BY created_at DESC";
