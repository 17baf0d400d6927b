//! SQL schema for the Perk SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS` and
/// `INSERT OR IGNORE` for the default levels.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS loyalty_levels (
    level_id         TEXT PRIMARY KEY,
    name             TEXT NOT NULL UNIQUE,
    min_points       INTEGER NOT NULL CHECK (min_points >= 0),
    bonus_multiplier TEXT NOT NULL,   -- exact decimal, e.g. '1.25'
    description      TEXT
);

CREATE TABLE IF NOT EXISTS users (
    user_id          TEXT PRIMARY KEY, -- issued by the identity provider
    email            TEXT NOT NULL,
    full_name        TEXT,
    points           INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
    loyalty_level_id TEXT REFERENCES loyalty_levels(level_id),
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

-- The ledger. Strictly append-only: no UPDATE or DELETE is ever issued
-- against this table. SUM(amount) per user equals users.points.
CREATE TABLE IF NOT EXISTS transactions (
    transaction_id TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL REFERENCES users(user_id),
    kind           TEXT NOT NULL CHECK (kind IN ('earned', 'spent', 'expired')),
    amount         INTEGER NOT NULL,
    description    TEXT NOT NULL,
    created_at     TEXT NOT NULL   -- RFC 3339 UTC, fixed width
);

CREATE TABLE IF NOT EXISTS rewards (
    reward_id    TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    description  TEXT,
    points_cost  INTEGER NOT NULL CHECK (points_cost > 0),
    image_url    TEXT,
    is_available INTEGER NOT NULL DEFAULT 1,
    stock        INTEGER CHECK (stock IS NULL OR stock >= 0), -- NULL = unlimited
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_rewards (
    user_reward_id TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL REFERENCES users(user_id),
    reward_id      TEXT NOT NULL REFERENCES rewards(reward_id),
    status         TEXT NOT NULL DEFAULT 'pending',
    redeemed_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS campaigns (
    campaign_id  TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    description  TEXT,
    bonus_points INTEGER NOT NULL DEFAULT 0,
    start_date   TEXT NOT NULL,
    end_date     TEXT NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS transactions_user_idx
    ON transactions(user_id, created_at);
CREATE INDEX IF NOT EXISTS user_rewards_user_idx
    ON user_rewards(user_id, redeemed_at);
CREATE INDEX IF NOT EXISTS rewards_cost_idx
    ON rewards(is_available, points_cost);

INSERT OR IGNORE INTO loyalty_levels
    (level_id, name, min_points, bonus_multiplier, description)
VALUES
    ('6f1c2a4e-0b7d-4c35-9a51-3d2b8e7f0001', 'Bronze',       0, '1.0',
     'Starting level for every member'),
    ('6f1c2a4e-0b7d-4c35-9a51-3d2b8e7f0002', 'Silver',    1000, '1.25',
     'A quarter more points on every purchase'),
    ('6f1c2a4e-0b7d-4c35-9a51-3d2b8e7f0003', 'Gold',      5000, '1.5',
     'Half again as many points on every purchase'),
    ('6f1c2a4e-0b7d-4c35-9a51-3d2b8e7f0004', 'Platinum', 15000, '2.0',
     'Double points on every purchase');

PRAGMA user_version = 1;
";
