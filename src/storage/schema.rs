//! Database schema definitions

/// Database schema version, equal to the number of migrations
pub const SCHEMA_VERSION: u32 = 3;

/// SQL for creating the token table
pub const CREATE_TOKENS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tokenized_texts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id TEXT NOT NULL,
    document_id TEXT NOT NULL,
    text TEXT NOT NULL,
    word TEXT NOT NULL,
    position INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tokens_word ON tokenized_texts(word);
"#;

/// SQL for creating the batch registry
pub const CREATE_BATCHES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS batches (
    batch_id TEXT PRIMARY KEY,
    source_path TEXT,
    created_at TEXT NOT NULL,
    status TEXT NOT NULL,
    document_count INTEGER NOT NULL DEFAULT 0
);
"#;

/// Registers batches that predate the registry table
pub const BACKFILL_BATCHES: &str = r#"
INSERT OR IGNORE INTO batches (batch_id, source_path, created_at, status, document_count)
SELECT batch_id, NULL, ?1, 'complete', COUNT(DISTINCT document_id)
FROM tokenized_texts
GROUP BY batch_id
"#;

/// One row per (batch, document, position); also serves the adjacency join
pub const CREATE_POSITION_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_doc_position
    ON tokenized_texts(batch_id, document_id, position);
"#;

/// SQL for creating the metadata table
pub const CREATE_METADATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Successor words of a keyword, restricted to the same batch and document.
/// Ties keep the order in which the successor word was first stored.
pub const NEXT_WORD_COUNTS: &str = r#"
SELECT nxt.word, COUNT(*) AS frequency, MIN(nxt.id) AS first_seen
FROM tokenized_texts AS cur
JOIN tokenized_texts AS nxt
  ON nxt.batch_id = cur.batch_id
 AND nxt.document_id = cur.document_id
 AND nxt.position = cur.position + 1
WHERE cur.word = ?1
GROUP BY nxt.word
ORDER BY frequency DESC, first_seen ASC
LIMIT ?2
"#;

pub const INSERT_TOKEN: &str = r#"
INSERT INTO tokenized_texts (batch_id, document_id, text, word, position)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const SELECT_BATCH_INFO: &str = r#"
SELECT b.batch_id, b.source_path, b.created_at, b.status, b.document_count,
       (SELECT COUNT(*) FROM tokenized_texts t WHERE t.batch_id = b.batch_id)
FROM batches b
ORDER BY b.created_at, b.batch_id
"#;
