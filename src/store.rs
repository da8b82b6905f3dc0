use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::backup::JsonBackup;
use crate::config::{AppConfig, ConfigError};
use crate::error::Error;
use crate::role::Role;
use crate::score::ScoreMap;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS test_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    pl_score INTEGER NOT NULL DEFAULT 0,
    ri_score INTEGER NOT NULL DEFAULT 0,
    co_score INTEGER NOT NULL DEFAULT 0,
    sh_score INTEGER NOT NULL DEFAULT 0,
    me_score INTEGER NOT NULL DEFAULT 0,
    tw_score INTEGER NOT NULL DEFAULT 0,
    imp_score INTEGER NOT NULL DEFAULT 0,
    cf_score INTEGER NOT NULL DEFAULT 0,
    sp_score INTEGER NOT NULL DEFAULT 0,
    primary_role TEXT,
    secondary_role TEXT
);
CREATE INDEX IF NOT EXISTS idx_test_results_username ON test_results(username);
";

// score columns follow Role::ALL
const SELECT_RESULTS: &str = "
SELECT id, username, timestamp,
       pl_score, ri_score, co_score, sh_score, me_score,
       tw_score, imp_score, cf_score, sp_score,
       primary_role, secondary_role
FROM test_results";

const SCORE_OFFSET: usize = 3;

/// A saved test result. Never changed after it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredResult {
    pub id: i64,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub scores: ScoreMap,
    pub primary_role: Option<Role>,
    pub secondary_role: Option<Role>,
}

impl StoredResult {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let timestamp: String = row.get(2)?;
        let timestamp = parse_timestamp(&timestamp).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err))
        })?;

        let mut scores = Vec::with_capacity(Role::ALL.len());
        for (offset, role) in Role::ALL.into_iter().enumerate() {
            let score: u32 = row.get(SCORE_OFFSET + offset)?;
            scores.push((role, score));
        }

        let role_at = |index: usize| -> rusqlite::Result<Option<Role>> {
            let value: Option<String> = row.get(index)?;
            value
                .map(|value| {
                    value.parse::<Role>().map_err(|err| {
                        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
                    })
                })
                .transpose()
        };
        let roles_at = SCORE_OFFSET + Role::ALL.len();

        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            timestamp,
            scores: scores.into_iter().collect(),
            primary_role: role_at(roles_at)?,
            secondary_role: role_at(roles_at + 1)?,
        })
    }
}

/// Usage summary over every stored result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_tests: usize,
    pub unique_users: usize,
    /// Primary role to number of results, most frequent first; ties in catalog order.
    pub popular_roles: Vec<(Role, usize)>,
}

/// Result history in SQLite, optionally mirrored to a JSON file.
///
/// Every call opens its own connection and drops it before returning, so nothing is
/// held open between calls. Writes report failures; reads log them and come back empty.
#[derive(Debug, Clone)]
pub struct ResultStore {
    db_path: PathBuf,
    backup: Option<JsonBackup>,
}

impl ResultStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            backup: None,
        }
    }

    pub fn with_backup(mut self, backup: JsonBackup) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let store = Self::new(&config.db_path);
        match &config.backup_path {
            Some(path) => store.with_backup(JsonBackup::new(path)),
            None => store,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn backup(&self) -> Option<&JsonBackup> {
        self.backup.as_ref()
    }

    fn connect(&self) -> Result<Connection, Error> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    /// Creates the database file and schema when missing. Safe to call on every start.
    pub fn initialize(&self) -> Result<(), Error> {
        self.create_schema().map_err(|err| {
            ConfigError::StorageUnavailable {
                path: self.db_path.clone(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    fn create_schema(&self) -> Result<(), Error> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Appends a result and returns its id.
    ///
    /// The timestamp is the current time, or the newest stored timestamp if the clock
    /// reads earlier, so history order never goes backwards.
    pub fn save(&self, username: &str, scores: &ScoreMap) -> Result<i64, Error> {
        let (primary, secondary) = scores.primary_and_secondary();
        let mut conn = self.connect()?;
        // rolled back on drop unless committed
        let tx = conn.transaction()?;

        let newest: Option<String> =
            tx.query_row("SELECT MAX(timestamp) FROM test_results", [], |row| {
                row.get(0)
            })?;
        // stored text keeps microseconds
        let now = Utc::now().trunc_subsecs(6);
        let timestamp = match newest.as_deref().map(parse_timestamp) {
            Some(Ok(newest)) if newest > now => newest,
            _ => now,
        };

        tx.execute(
            "INSERT INTO test_results (
                username, timestamp,
                pl_score, ri_score, co_score, sh_score, me_score,
                tw_score, imp_score, cf_score, sp_score,
                primary_role, secondary_role
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                username,
                format_timestamp(&timestamp),
                scores.get(Role::Plant),
                scores.get(Role::ResourceInvestigator),
                scores.get(Role::Coordinator),
                scores.get(Role::Shaper),
                scores.get(Role::MonitorEvaluator),
                scores.get(Role::Teamworker),
                scores.get(Role::Implementer),
                scores.get(Role::CompleterFinisher),
                scores.get(Role::Specialist),
                primary.map(|role| role.id()),
                secondary.map(|role| role.id()),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        info!(id, username, primary = ?primary, "saved test result");

        if let Some(backup) = &self.backup {
            if let Err(err) = backup.append(username, scores, timestamp) {
                warn!(%err, path = %backup.path().display(), "failed to mirror result to json");
            }
        }

        Ok(id)
    }

    /// Results for exactly `username`, newest first.
    pub fn user_results(&self, username: &str) -> Vec<StoredResult> {
        self.query_results(Some(username)).unwrap_or_else(|err| {
            error!(%err, username, "failed to load user results");
            Vec::new()
        })
    }

    /// Most recent result for `username`, if any.
    pub fn latest_result(&self, username: &str) -> Option<StoredResult> {
        self.user_results(username).into_iter().next()
    }

    /// Every result, newest first.
    pub fn all_results(&self) -> Vec<StoredResult> {
        self.query_results(None).unwrap_or_else(|err| {
            error!(%err, "failed to load results");
            Vec::new()
        })
    }

    fn query_results(&self, username: Option<&str>) -> Result<Vec<StoredResult>, Error> {
        let conn = self.connect()?;
        let results = match username {
            Some(username) => {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_RESULTS} WHERE username = ?1 ORDER BY timestamp DESC, id DESC"
                ))?;
                let rows = stmt.query_map(params![username], StoredResult::from_row)?;
                let results = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                results
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_RESULTS} ORDER BY timestamp DESC, id DESC"
                ))?;
                let rows = stmt.query_map([], StoredResult::from_row)?;
                let results = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                results
            }
        };
        Ok(results)
    }

    /// Removes every result for `username` and returns how many went.
    pub fn delete_user_results(&self, username: &str) -> Result<usize, Error> {
        let conn = self.connect()?;
        let deleted = conn.execute(
            "DELETE FROM test_results WHERE username = ?1",
            params![username],
        )?;
        info!(username, deleted, "deleted test results");
        Ok(deleted)
    }

    pub fn statistics(&self) -> Statistics {
        self.query_statistics().unwrap_or_else(|err| {
            error!(%err, "failed to compute statistics");
            Statistics::default()
        })
    }

    fn query_statistics(&self) -> Result<Statistics, Error> {
        let conn = self.connect()?;
        let (total_tests, unique_users): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT username) FROM test_results",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT primary_role, COUNT(*) FROM test_results
             WHERE primary_role IS NOT NULL
             GROUP BY primary_role",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut popular_roles = Vec::new();
        for row in rows {
            let (role, count) = row?;
            match role.parse::<Role>() {
                Ok(role) => popular_roles.push((role, usize::try_from(count).unwrap_or(0))),
                Err(err) => warn!(%err, "skipping unknown primary role"),
            }
        }
        popular_roles.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(Statistics {
            total_tests: usize::try_from(total_tests).unwrap_or(0),
            unique_users: usize::try_from(unique_users).unwrap_or(0),
            popular_roles,
        })
    }
}

// Fixed width, so text order in SQLite matches time order.
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|timestamp| timestamp.with_timezone(&Utc))
}
