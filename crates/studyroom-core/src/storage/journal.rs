//! SQLite journal of session hand-offs and study statistics.
//!
//! Every hand-off attempt is appended, whether the session store accepted
//! it or not. Statistics only count accepted (`recorded`) sessions.

use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::JournalError;
use crate::session::wire::local_time;
use crate::session::{StudySession, WIRE_TIME_FORMAT};

const SCHEMA: &str = indoc::indoc! {"
    CREATE TABLE IF NOT EXISTS sessions (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        course_id    INTEGER NOT NULL,
        topic_id     INTEGER NOT NULL,
        start_time   TEXT NOT NULL,
        end_time     TEXT NOT NULL,
        duration_min INTEGER NOT NULL,
        status       TEXT NOT NULL,
        remote_id    INTEGER,
        error        TEXT,
        logged_at    TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);
    CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);
    CREATE INDEX IF NOT EXISTS idx_sessions_course ON sessions(course_id, status);
    CREATE INDEX IF NOT EXISTS idx_sessions_topic ON sessions(topic_id, status);

    CREATE TABLE IF NOT EXISTS goals (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        title      TEXT NOT NULL,
        kind       TEXT NOT NULL,
        target     INTEGER NOT NULL,
        progress   INTEGER NOT NULL DEFAULT 0,
        completed  INTEGER NOT NULL DEFAULT 0,
        updated_on TEXT
    );
"};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    Recorded,
    Failed,
}

impl JournalStatus {
    fn as_str(self) -> &'static str {
        match self {
            JournalStatus::Recorded => "recorded",
            JournalStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "recorded" => Some(JournalStatus::Recorded),
            "failed" => Some(JournalStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    pub course_id: i64,
    pub topic_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_min: u64,
    pub status: JournalStatus,
    pub remote_id: Option<i64>,
    pub error: Option<String>,
}

impl JournalEntry {
    pub fn is_recorded(&self) -> bool {
        self.status == JournalStatus::Recorded
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub recorded_sessions: u64,
    pub recorded_min: u64,
    pub failed_attempts: u64,
    pub today_sessions: u64,
    pub today_min: u64,
}

/// Minutes studied on one day. Only days with a positive total are listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_min: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekdayTotal {
    /// Upper-case English day name, e.g. `MONDAY`.
    pub weekday: String,
    pub minutes: u64,
}

/// Minutes per weekday of the week containing `today`, Monday first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub days: Vec<WeekdayTotal>,
}

impl WeeklySummary {
    pub fn total_min(&self) -> u64 {
        self.days.iter().map(|d| d.minutes).sum()
    }
}

/// What a goal counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// Recorded minutes; `target` is in minutes.
    Hours,
    /// Recorded sessions.
    SessionCount,
    /// Current streak length in days.
    Streak,
}

impl GoalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalKind::Hours => "hours",
            GoalKind::SessionCount => "session_count",
            GoalKind::Streak => "streak",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hours" => Some(GoalKind::Hours),
            "session_count" => Some(GoalKind::SessionCount),
            "streak" => Some(GoalKind::Streak),
            _ => None,
        }
    }
}

/// A local study goal. Once completed it stays completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub id: i64,
    pub title: String,
    pub kind: GoalKind,
    pub target: u64,
    pub progress: u64,
    pub completed: bool,
    pub updated_on: Option<NaiveDate>,
}

/// SQLite journal of hand-off attempts.
pub struct Journal {
    conn: Connection,
}

impl Journal {
    /// Open the journal at `~/.config/studyroom/studyroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> crate::error::Result<Self> {
        let dir = data_dir()?;
        Ok(Self::open_at(&dir.join("studyroom.db"))?)
    }

    pub fn open_at(path: &Path) -> Result<Self, JournalError> {
        let conn = Connection::open(path).map_err(|source| JournalError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let journal = Self { conn };
        journal.migrate()?;
        Ok(journal)
    }

    /// Open an in-memory journal (for tests and offline dry runs).
    pub fn open_memory() -> Result<Self, JournalError> {
        let conn = Connection::open_in_memory()?;
        let journal = Self { conn };
        journal.migrate()?;
        Ok(journal)
    }

    fn migrate(&self) -> Result<(), JournalError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Append a session the store accepted and credit it to open goals.
    pub fn record_success(
        &self,
        session: &StudySession,
        remote_id: Option<i64>,
    ) -> Result<i64, JournalError> {
        let id = self.insert(session, JournalStatus::Recorded, remote_id, None)?;
        let on = session.start_time.date();
        self.add_goal_progress(GoalKind::Hours, session.duration_in_minutes, on)?;
        self.add_goal_progress(GoalKind::SessionCount, 1, on)?;
        Ok(id)
    }

    /// Append a session the store did not accept.
    pub fn record_failure(&self, session: &StudySession, error: &str) -> Result<i64, JournalError> {
        self.insert(session, JournalStatus::Failed, None, Some(error))
    }

    fn insert(
        &self,
        session: &StudySession,
        status: JournalStatus,
        remote_id: Option<i64>,
        error: Option<&str>,
    ) -> Result<i64, JournalError> {
        self.conn.execute(
            "INSERT INTO sessions
                (course_id, topic_id, start_time, end_time, duration_min,
                 status, remote_id, error, logged_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session.course_id,
                session.topic_id,
                session.start_time.format(WIRE_TIME_FORMAT).to_string(),
                session.end_time.format(WIRE_TIME_FORMAT).to_string(),
                session.duration_in_minutes,
                status.as_str(),
                remote_id,
                error,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Newest entries first.
    pub fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, topic_id, start_time, end_time, duration_min,
                    status, remote_id, error
             FROM sessions
             ORDER BY start_time DESC, id DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], RawEntry::from_row)?;
        let entries = rows
            .map(|row| -> Result<JournalEntry, JournalError> { row?.decode() })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn stats_all(&self, today: NaiveDate) -> Result<Stats, JournalError> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions
             GROUP BY status",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (status, count, minutes) = row?;
            match JournalStatus::parse(&status) {
                Some(JournalStatus::Recorded) => {
                    stats.recorded_sessions += count;
                    stats.recorded_min += minutes;
                }
                Some(JournalStatus::Failed) => stats.failed_attempts += count,
                None => {}
            }
        }

        let (today_sessions, today_min) = self.recorded_on(today)?;
        stats.today_sessions = today_sessions;
        stats.today_min = today_min;
        Ok(stats)
    }

    /// Only today's entries.
    pub fn stats_today(&self, today: NaiveDate) -> Result<Stats, JournalError> {
        let (today_sessions, today_min) = self.recorded_on(today)?;
        let failed_attempts = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions
             WHERE status = 'failed' AND substr(start_time, 1, 10) = ?1",
            params![day_key(today)],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(Stats {
            recorded_sessions: today_sessions,
            recorded_min: today_min,
            failed_attempts,
            today_sessions,
            today_min,
        })
    }

    fn recorded_on(&self, day: NaiveDate) -> Result<(u64, u64), JournalError> {
        let row = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions
             WHERE status = 'recorded' AND substr(start_time, 1, 10) = ?1",
            params![day_key(day)],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        Ok(row)
    }

    /// Recorded minutes per day, newest first, skipping empty days.
    pub fn daily_summary(&self) -> Result<Vec<DailySummary>, JournalError> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(start_time, 1, 10) AS day, COALESCE(SUM(duration_min), 0)
             FROM sessions
             WHERE status = 'recorded'
             GROUP BY day
             HAVING SUM(duration_min) > 0
             ORDER BY day DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (day, total_min) = row?;
            let date = parse_day(&day)?;
            out.push(DailySummary { date, total_min });
        }
        Ok(out)
    }

    /// Recorded minutes for each day of the week containing `today`.
    pub fn weekly_summary(&self, today: NaiveDate) -> Result<WeeklySummary, JournalError> {
        let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let week_end = week_start + Duration::days(7);

        let mut stmt = self.conn.prepare(
            "SELECT substr(start_time, 1, 10) AS day, COALESCE(SUM(duration_min), 0)
             FROM sessions
             WHERE status = 'recorded'
               AND substr(start_time, 1, 10) >= ?1
               AND substr(start_time, 1, 10) < ?2
             GROUP BY day",
        )?;
        let rows = stmt.query_map(params![day_key(week_start), day_key(week_end)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut minutes = [0u64; 7];
        for row in rows {
            let (day, total) = row?;
            let date = parse_day(&day)?;
            minutes[date.weekday().num_days_from_monday() as usize] += total;
        }

        let days = WEEKDAYS
            .iter()
            .zip(minutes)
            .map(|(weekday, minutes)| WeekdayTotal {
                weekday: weekday_name(*weekday).to_string(),
                minutes,
            })
            .collect();
        Ok(WeeklySummary { week_start, days })
    }

    /// Consecutive days, ending today, with at least one recorded session.
    pub fn streak(&self, today: NaiveDate) -> Result<u32, JournalError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT substr(start_time, 1, 10) AS day
             FROM sessions
             WHERE status = 'recorded'
             ORDER BY day DESC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut streak = 0u32;
        let mut expected = today;
        for row in rows {
            let date = parse_day(&row?)?;
            if date > today {
                continue;
            }
            if date != expected {
                break;
            }
            streak += 1;
            expected = expected - Duration::days(1);
        }
        self.set_goal_progress(GoalKind::Streak, u64::from(streak), today)?;
        Ok(streak)
    }

    pub fn total_minutes_by_course(&self, course_id: i64) -> Result<u64, JournalError> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_min), 0) FROM sessions
             WHERE status = 'recorded' AND course_id = ?1",
            params![course_id],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(total)
    }

    pub fn total_minutes_by_topic(&self, topic_id: i64) -> Result<u64, JournalError> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_min), 0) FROM sessions
             WHERE status = 'recorded' AND topic_id = ?1",
            params![topic_id],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(total)
    }

    /// Start tracking a goal with zero progress.
    pub fn add_goal(&self, title: &str, kind: GoalKind, target: u64) -> Result<Goal, JournalError> {
        if target == 0 {
            return Err(JournalError::InvalidGoal("target must be at least 1".into()));
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(JournalError::InvalidGoal("title must not be empty".into()));
        }
        self.conn.execute(
            "INSERT INTO goals (title, kind, target) VALUES (?1, ?2, ?3)",
            params![title, kind.as_str(), target],
        )?;
        Ok(Goal {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            kind,
            target,
            progress: 0,
            completed: false,
            updated_on: None,
        })
    }

    /// All goals, oldest first.
    pub fn goals(&self) -> Result<Vec<Goal>, JournalError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, kind, target, progress, completed, updated_on
             FROM goals
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, u64>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut goals = Vec::new();
        for row in rows {
            let (id, title, kind, target, progress, completed, updated_on) = row?;
            let kind = GoalKind::parse(&kind).ok_or_else(|| JournalError::CorruptRow {
                id,
                message: format!("unknown goal kind '{kind}'"),
            })?;
            let updated_on = updated_on.as_deref().map(parse_day).transpose()?;
            goals.push(Goal {
                id,
                title,
                kind,
                target,
                progress,
                completed,
                updated_on,
            });
        }
        Ok(goals)
    }

    /// Returns false when no goal has this id.
    pub fn remove_goal(&self, id: i64) -> Result<bool, JournalError> {
        let removed = self.conn.execute("DELETE FROM goals WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn add_goal_progress(
        &self,
        kind: GoalKind,
        amount: u64,
        on: NaiveDate,
    ) -> Result<(), JournalError> {
        self.conn.execute(
            "UPDATE goals
             SET progress = progress + ?2,
                 completed = CASE WHEN progress + ?2 >= target THEN 1 ELSE completed END,
                 updated_on = ?3
             WHERE kind = ?1",
            params![kind.as_str(), amount, day_key(on)],
        )?;
        Ok(())
    }

    fn set_goal_progress(
        &self,
        kind: GoalKind,
        value: u64,
        on: NaiveDate,
    ) -> Result<(), JournalError> {
        self.conn.execute(
            "UPDATE goals
             SET progress = ?2,
                 completed = CASE WHEN ?2 >= target THEN 1 ELSE completed END,
                 updated_on = ?3
             WHERE kind = ?1",
            params![kind.as_str(), value, day_key(on)],
        )?;
        Ok(())
    }
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn parse_day(raw: &str) -> Result<NaiveDate, JournalError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| JournalError::QueryFailed(format!("bad day '{raw}': {e}")))
}

/// Row as stored, before timestamp/status decoding.
struct RawEntry {
    id: i64,
    course_id: i64,
    topic_id: i64,
    start_time: String,
    end_time: String,
    duration_min: u64,
    status: String,
    remote_id: Option<i64>,
    error: Option<String>,
}

impl RawEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            course_id: row.get(1)?,
            topic_id: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            duration_min: row.get(5)?,
            status: row.get(6)?,
            remote_id: row.get(7)?,
            error: row.get(8)?,
        })
    }

    fn decode(self) -> Result<JournalEntry, JournalError> {
        let id = self.id;
        let corrupt = |message: String| JournalError::CorruptRow { id, message };
        Ok(JournalEntry {
            id,
            course_id: self.course_id,
            topic_id: self.topic_id,
            start_time: local_time::parse(&self.start_time).map_err(|e| corrupt(e.to_string()))?,
            end_time: local_time::parse(&self.end_time).map_err(|e| corrupt(e.to_string()))?,
            duration_min: self.duration_min,
            status: JournalStatus::parse(&self.status)
                .ok_or_else(|| corrupt(format!("unknown status '{}'", self.status)))?,
            remote_id: self.remote_id,
            error: self.error,
        })
    }
}
