//! SQL schema for the Brief SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS articles (
    url              TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    source           TEXT NOT NULL,
    published_date   TEXT,            -- RFC 3339 UTC
    image_url        TEXT,
    status           TEXT NOT NULL DEFAULT 'fetched'
                     CHECK (status IN ('fetched', 'filtered_in', 'filtered_out', 'scraped', 'analyzed')),
    filter_score     INTEGER,
    filter_reason    TEXT,
    content          TEXT,
    scraped_at       TEXT,
    summary          TEXT,
    tags             TEXT,            -- JSON-encoded ArticleTags
    author_intent    TEXT,
    impact_analysis  TEXT,
    analyzed_at      TEXT,
    model_version    TEXT,
    language         TEXT,
    importance_score INTEGER,
    origin           TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

-- One row per UTC date; re-synthesis replaces the row.
CREATE TABLE IF NOT EXISTS daily_insights (
    date                     TEXT PRIMARY KEY,   -- YYYY-MM-DD
    main_trends              TEXT NOT NULL DEFAULT '[]',
    hidden_insights          TEXT NOT NULL DEFAULT '[]',
    media_steering_analysis  TEXT,
    hot_topics               TEXT NOT NULL DEFAULT '[]',
    market_sentiment_overlay TEXT,
    created_at               TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS articles_status_idx    ON articles(status);
CREATE INDEX IF NOT EXISTS articles_published_idx ON articles(published_date);

PRAGMA user_version = 1;
";
