//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Catalog ────────────────────────────────────────────────────────────────
-- Rows are retired through is_obsolete and never deleted.

CREATE TABLE IF NOT EXISTS terms (
    term_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    start_date  TEXT NOT NULL,            -- YYYY-MM-DD
    end_date    TEXT NOT NULL,
    is_obsolete INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,            -- RFC 3339 UTC
    modified_at TEXT NOT NULL,
    CHECK (end_date >= start_date)
);

CREATE TABLE IF NOT EXISTS courses (
    course_id   TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    is_obsolete INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS course_classes (
    course_class_id TEXT PRIMARY KEY,
    course_id       TEXT NOT NULL REFERENCES courses(course_id),
    term_id         TEXT NOT NULL REFERENCES terms(term_id),
    code            TEXT NOT NULL,
    is_obsolete     INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    modified_at     TEXT NOT NULL,
    UNIQUE (course_id, term_id, code)
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    first_name  TEXT NOT NULL,
    family_name TEXT NOT NULL,
    role        TEXT NOT NULL,            -- 'tenant_admin' | 'accountant' | 'instructor'
    is_obsolete INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    student_id  TEXT PRIMARY KEY,
    first_name  TEXT NOT NULL,
    family_name TEXT NOT NULL,
    dob         TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    is_obsolete INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL,
    UNIQUE (family_name, first_name, dob)
);

CREATE TABLE IF NOT EXISTS career_steps (
    career_step_id  TEXT PRIMARY KEY,
    employee_id     TEXT NOT NULL REFERENCES employees(employee_id),
    start_date      TEXT NOT NULL,
    end_date        TEXT,                 -- NULL = open-ended
    function        TEXT NOT NULL,
    salary          TEXT NOT NULL,        -- exact decimal
    competence_area TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL,
    modified_at     TEXT NOT NULL,
    CHECK (end_date IS NULL OR end_date >= start_date)
);

CREATE TABLE IF NOT EXISTS custodians (
    custodian_id TEXT PRIMARY KEY,
    student_id   TEXT NOT NULL REFERENCES students(student_id),
    name         TEXT NOT NULL,
    relation     TEXT NOT NULL,
    phone        TEXT NOT NULL DEFAULT '',
    email        TEXT NOT NULL DEFAULT '',  -- '' = unknown
    is_obsolete  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    modified_at  TEXT NOT NULL
);

-- Retired custodians do not block re-adding the same person.
CREATE UNIQUE INDEX IF NOT EXISTS custodians_one_live
    ON custodians(student_id, name, relation)
    WHERE is_obsolete = 0;

CREATE TABLE IF NOT EXISTS family_members (
    family_member_id TEXT PRIMARY KEY,
    employee_id      TEXT NOT NULL REFERENCES employees(employee_id),
    name             TEXT NOT NULL,
    relation         TEXT NOT NULL,
    is_obsolete      INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    modified_at      TEXT NOT NULL
);

-- ── Engine ─────────────────────────────────────────────────────────────────

-- Only exit_date is ever updated; rows are never deleted.
CREATE TABLE IF NOT EXISTS instructor_assignments (
    assignment_id   TEXT PRIMARY KEY,
    instructor_id   TEXT NOT NULL REFERENCES employees(employee_id),
    course_class_id TEXT NOT NULL REFERENCES course_classes(course_class_id),
    assigned_on     TEXT NOT NULL,
    exit_date       TEXT,                 -- NULL while the assignment is open
    created_at      TEXT NOT NULL,
    modified_at     TEXT NOT NULL,
    CHECK (exit_date IS NULL OR exit_date >= assigned_on)
);

-- One open assignment per (instructor, class).
CREATE UNIQUE INDEX IF NOT EXISTS instructor_assignments_one_open
    ON instructor_assignments(instructor_id, course_class_id)
    WHERE exit_date IS NULL;

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id   TEXT PRIMARY KEY,
    student_id      TEXT NOT NULL REFERENCES students(student_id),
    course_class_id TEXT NOT NULL REFERENCES course_classes(course_class_id),
    course_id       TEXT NOT NULL REFERENCES courses(course_id),
    term_id         TEXT NOT NULL REFERENCES terms(term_id),
    status          TEXT NOT NULL DEFAULT 'enquired',
    comment         TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL,
    modified_at     TEXT NOT NULL,
    CHECK (status IN ('enquired', 'active', 'closed'))
);

-- At most one active and one enquired record per (student, class).
CREATE UNIQUE INDEX IF NOT EXISTS enrollments_one_active
    ON enrollments(student_id, course_class_id)
    WHERE status = 'active';

CREATE UNIQUE INDEX IF NOT EXISTS enrollments_one_enquired
    ON enrollments(student_id, course_class_id)
    WHERE status = 'enquired';

CREATE INDEX IF NOT EXISTS enrollments_student_status_idx ON enrollments(student_id, status);
CREATE INDEX IF NOT EXISTS enrollments_class_idx          ON enrollments(course_class_id);
CREATE INDEX IF NOT EXISTS assignments_class_idx          ON instructor_assignments(course_class_id);
CREATE INDEX IF NOT EXISTS career_steps_employee_idx      ON career_steps(employee_id);
CREATE INDEX IF NOT EXISTS family_members_employee_idx    ON family_members(employee_id);

PRAGMA user_version = 2;
";
