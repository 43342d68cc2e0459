use std::time::{Duration, Instant};

use log::LevelFilter;

/// Controls how executed statements are logged.
///
/// Every statement is logged at `statements_level` once its rows have been consumed (or its
/// rowset dropped). Statements that ran for at least `slow_statements_duration` are logged at
/// `slow_statements_level` instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub(crate) statements_level: LevelFilter,
    pub(crate) slow_statements_level: LevelFilter,
    pub(crate) slow_statements_duration: Duration,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            statements_level: LevelFilter::Info,
            slow_statements_level: LevelFilter::Warn,
            slow_statements_duration: Duration::from_secs(1),
        }
    }
}

impl LogSettings {
    pub fn log_statements(&mut self, level: LevelFilter) {
        self.statements_level = level;
    }

    pub fn log_slow_statements(&mut self, level: LevelFilter, duration: Duration) {
        self.slow_statements_level = level;
        self.slow_statements_duration = duration;
    }

    pub fn statements_level(&self) -> LevelFilter {
        self.statements_level
    }

    pub fn slow_statements_level(&self) -> LevelFilter {
        self.slow_statements_level
    }

    pub fn slow_statements_duration(&self) -> Duration {
        self.slow_statements_duration
    }
}

pub(crate) struct QueryLogger<'q> {
    sql: &'q str,
    rows_returned: u64,
    rows_affected: u64,
    start: Instant,
    settings: LogSettings,
}

impl<'q> QueryLogger<'q> {
    pub(crate) fn new(sql: &'q str, settings: LogSettings) -> Self {
        Self {
            sql,
            rows_returned: 0,
            rows_affected: 0,
            start: Instant::now(),
            settings,
        }
    }

    pub(crate) fn increment_rows_returned(&mut self) {
        self.rows_returned += 1;
    }

    pub(crate) fn increase_rows_affected(&mut self, n: u64) {
        self.rows_affected += n;
    }

    pub(crate) fn finish(&self) {
        let elapsed = self.start.elapsed();

        let lvl = if elapsed >= self.settings.slow_statements_duration {
            self.settings.slow_statements_level
        } else {
            self.settings.statements_level
        };

        if let Some(lvl) = lvl.to_level() {
            if log::log_enabled!(target: "stddb::query", lvl) {
                log::log!(
                    target: "stddb::query",
                    lvl,
                    "{}; rows affected: {}, rows returned: {}, elapsed: {:.3?}",
                    summarize(self.sql),
                    self.rows_affected,
                    self.rows_returned,
                    elapsed
                );
            }
        }
    }
}

impl Drop for QueryLogger<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

const SUMMARY_LEN: usize = 100;

// first statement words on one line, truncated
fn summarize(sql: &str) -> String {
    let mut summary = String::with_capacity(SUMMARY_LEN.min(sql.len()));

    for word in sql.split_whitespace() {
        if !summary.is_empty() {
            summary.push(' ');
        }

        summary.push_str(word);

        if summary.len() > SUMMARY_LEN {
            let mut end = SUMMARY_LEN;
            while !summary.is_char_boundary(end) {
                end -= 1;
            }
            summary.truncate(end);
            summary.push_str(" …");
            break;
        }
    }

    summary
}
