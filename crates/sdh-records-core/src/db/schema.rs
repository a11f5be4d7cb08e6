//! SQLite schema definition.

/// Complete database schema for the local record store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    local_id TEXT PRIMARY KEY,
    server_id TEXT,                              -- NULL until first sync
    name TEXT NOT NULL,
    age_years INTEGER NOT NULL CHECK (age_years BETWEEN 0 AND 150),
    sex TEXT NOT NULL DEFAULT 'unknown',         -- male, female, unknown
    anticoagulated INTEGER NOT NULL DEFAULT 0,
    antiplatelet INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_server_id ON patients(server_id);
CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Episodes
-- ============================================================================

CREATE TABLE IF NOT EXISTS episodes (
    local_id TEXT PRIMARY KEY,
    server_id TEXT,
    patient_id TEXT NOT NULL REFERENCES patients(local_id) ON DELETE CASCADE,
    start_date TEXT NOT NULL,                    -- YYYY-MM-DD
    discharge_date TEXT,                         -- NULL while open
    antecedent TEXT NOT NULL DEFAULT 'unknown',
    time_since_antecedent_days INTEGER,
    age_at_episode INTEGER NOT NULL,
    gcs_on_admission INTEGER,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (discharge_date IS NULL OR discharge_date >= start_date)
);

CREATE INDEX IF NOT EXISTS idx_episodes_patient ON episodes(patient_id);

-- ============================================================================
-- Operative Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS operative_records (
    local_id TEXT PRIMARY KEY,
    server_id TEXT,
    episode_id TEXT NOT NULL REFERENCES episodes(local_id) ON DELETE CASCADE,
    operation_date TEXT NOT NULL,
    procedure TEXT NOT NULL,
    side TEXT NOT NULL,
    drain_placed INTEGER NOT NULL DEFAULT 0,
    age_at_operation INTEGER NOT NULL,
    days_from_admission INTEGER NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_operative_episode ON operative_records(episode_id);

-- ============================================================================
-- Post-Operative Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS post_operative_records (
    local_id TEXT PRIMARY KEY,
    server_id TEXT,
    operative_record_id TEXT NOT NULL REFERENCES operative_records(local_id) ON DELETE CASCADE,
    follow_up_date TEXT NOT NULL,
    days_after_surgery INTEGER NOT NULL,
    rankin_score INTEGER,                        -- modified Rankin scale
    recurrence INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_post_operative_record ON post_operative_records(operative_record_id);

-- ============================================================================
-- Hematoma Measurements
-- ============================================================================

CREATE TABLE IF NOT EXISTS hematoma_measurements (
    local_id TEXT PRIMARY KEY,
    server_id TEXT,
    episode_id TEXT NOT NULL REFERENCES episodes(local_id) ON DELETE CASCADE,
    side TEXT NOT NULL,
    thickness_mm REAL NOT NULL CHECK (thickness_mm >= 0),
    midline_shift_mm REAL,
    volume_ml REAL,
    density TEXT NOT NULL DEFAULT 'mixed',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_hematoma_episode ON hematoma_measurements(episode_id);

-- ============================================================================
-- UI State (key -> JSON blob)
-- ============================================================================

CREATE TABLE IF NOT EXISTS app_state (
    state_key TEXT PRIMARY KEY,
    state_value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
