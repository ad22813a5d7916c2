//! Calendar-partitioned file persistence
//!
//! Each finished record is appended, markup-stripped, to a file derived from
//! the current date. Historical logs are reconstructed by re-deriving those
//! paths and reading them back, aggregated by day, month, or year.
//!
//! I/O failures never propagate to the caller: they are reported through the
//! non-notifying side channel and the operation degrades to an empty result,
//! so the logging path stays available when the filesystem is not. Callers
//! of the read operations cannot distinguish "no data" from "read failed"
//! by the return value alone.

mod paths;

pub use paths::{CalendarDay, Clock, LocalClock};

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::record::{LogKind, LogRecord};
use crate::storage::Storage;

/// Non-notifying log sink used for reporting persistence failures.
///
/// Logging a failure through the regular path would notify persistence again
/// and loop; implementors must write to console and history without firing
/// subscriber events.
pub trait SideLog: Send + Sync {
    fn side_log(&self, kind: LogKind, message: &str);
}

/// Stateful writer/reader bound to a root directory
pub struct FilePersistence {
    root: PathBuf,
    storage: Arc<dyn Storage>,
    clock: Box<dyn Clock>,
    side: Arc<dyn SideLog>,
}

impl FilePersistence {
    pub fn new(
        root: impl Into<PathBuf>,
        storage: Arc<dyn Storage>,
        side: Arc<dyn SideLog>,
    ) -> Self {
        Self::with_clock(root, storage, side, Box::new(LocalClock))
    }

    pub fn with_clock(
        root: impl Into<PathBuf>,
        storage: Arc<dyn Storage>,
        side: Arc<dyn SideLog>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            root: paths::normalize_root(&root.into()),
            storage,
            clock,
            side,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append a finished record to today's file. A non-empty `kind_suffix`
    /// additionally appends to the suffixed day file, so warning and error
    /// streams can be read in isolation.
    pub async fn on_record_ready(&self, record: &LogRecord, kind_suffix: &str) {
        let today = self.clock.today();
        let line = format!(
            "{}{}{}\n",
            record.prefix(),
            record.separator(),
            record.clean()
        );

        let month_dir = paths::month_dir(&self.root, today.year, today.month);
        if let Err(err) = self.storage.ensure_dir(&month_dir).await {
            self.handle_failure(&err);
            return;
        }
        if let Err(err) = self
            .storage
            .append(&paths::day_file(&self.root, &today, ""), &line)
            .await
        {
            self.handle_failure(&err);
        }
        if !kind_suffix.is_empty() {
            if let Err(err) = self
                .storage
                .append(&paths::day_file(&self.root, &today, kind_suffix), &line)
                .await
            {
                self.handle_failure(&err);
            }
        }
    }

    /// Lines of the current day's file.
    pub async fn latest_log(&self) -> Vec<String> {
        let today = self.clock.today();
        self.read_day(&today).await
    }

    /// Lines for a given day. An omitted day reads the current day's file;
    /// out-of-range day or month values fall back to the current calendar
    /// with a warning on the side channel instead of failing the call.
    pub async fn log_by_day(
        &self,
        day: Option<u32>,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Vec<String> {
        let Some(day) = day else {
            return self.latest_log().await;
        };
        let today = self.clock.today();
        let target = CalendarDay {
            year: year.unwrap_or(today.year),
            month: self.resolve_month(month, &today),
            day: self.resolve_day(day, &today),
        };
        self.read_day(&target).await
    }

    /// Mapping from day number to that day's lines, for every plain day file
    /// in the month directory. Filenames that are not purely numeric before
    /// the `.log` extension (including the suffixed warn/error files) are
    /// skipped.
    pub async fn logs_by_month(
        &self,
        month: Option<u32>,
        year: Option<i32>,
    ) -> BTreeMap<u32, Vec<String>> {
        let today = self.clock.today();
        let month = self.resolve_month(month, &today);
        let year = year.unwrap_or(today.year);

        let names = match self
            .storage
            .list_dir(&paths::month_dir(&self.root, year, month))
            .await
        {
            Ok(names) => names,
            Err(err) => {
                self.handle_failure(&err);
                return BTreeMap::new();
            }
        };

        let mut result = BTreeMap::new();
        for name in names {
            let Some(stem) = name.strip_suffix(".log") else {
                continue;
            };
            let Ok(day) = stem.parse::<u32>() else {
                continue;
            };
            let lines = self.log_by_day(Some(day), Some(month), Some(year)).await;
            result.insert(day, lines);
        }
        result
    }

    /// Mapping from month number to that month's day mapping, for every
    /// numeric subdirectory of the year directory.
    pub async fn logs_by_year(
        &self,
        year: Option<i32>,
    ) -> BTreeMap<u32, BTreeMap<u32, Vec<String>>> {
        let today = self.clock.today();
        let year = year.unwrap_or(today.year);

        let names = match self
            .storage
            .list_dir(&paths::year_dir(&self.root, year))
            .await
        {
            Ok(names) => names,
            Err(err) => {
                self.handle_failure(&err);
                return BTreeMap::new();
            }
        };

        let mut result = BTreeMap::new();
        for name in names {
            let Ok(month) = name.parse::<u32>() else {
                continue;
            };
            let days = self.logs_by_month(Some(month), Some(year)).await;
            result.insert(month, days);
        }
        result
    }

    async fn read_day(&self, day: &CalendarDay) -> Vec<String> {
        let month_dir = paths::month_dir(&self.root, day.year, day.month);
        if let Err(err) = self.storage.ensure_dir(&month_dir).await {
            self.handle_failure(&err);
            return Vec::new();
        }
        match self
            .storage
            .read_lines(&paths::day_file(&self.root, day, ""))
            .await
        {
            Ok(lines) => lines,
            Err(err) => {
                self.handle_failure(&err);
                Vec::new()
            }
        }
    }

    fn resolve_month(&self, month: Option<u32>, today: &CalendarDay) -> u32 {
        match month {
            Some(value) if (1..=12).contains(&value) => value,
            Some(value) => {
                self.side.side_log(
                    LogKind::Warn,
                    &format!("month {value} is out of range, using the current month"),
                );
                today.month
            }
            None => today.month,
        }
    }

    fn resolve_day(&self, day: u32, today: &CalendarDay) -> u32 {
        if (1..=31).contains(&day) {
            day
        } else {
            self.side.side_log(
                LogKind::Warn,
                &format!("day {day} is out of range, using the current day"),
            );
            today.day
        }
    }

    /// Single funnel for all storage failures.
    fn handle_failure(&self, err: &io::Error) {
        self.side.side_log(LogKind::Error, &err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogValue;
    use crate::storage::FsStorage;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedClock(CalendarDay);

    impl Clock for FixedClock {
        fn today(&self) -> CalendarDay {
            self.0
        }
    }

    #[derive(Default)]
    struct CollectingSideLog(Mutex<Vec<(LogKind, String)>>);

    impl SideLog for CollectingSideLog {
        fn side_log(&self, kind: LogKind, message: &str) {
            self.0.lock().unwrap().push((kind, message.to_string()));
        }
    }

    fn persistence(
        root: &Path,
        side: Arc<CollectingSideLog>,
    ) -> FilePersistence {
        let clock = FixedClock(CalendarDay {
            year: 2023,
            month: 3,
            day: 7,
        });
        FilePersistence::with_clock(root, Arc::new(FsStorage), side, Box::new(clock))
    }

    fn sample_record(body: &str) -> LogRecord {
        LogRecord::new("2023-03-07 10:00:00", " : ", LogKind::None, &[LogValue::from(body)])
    }

    #[tokio::test]
    async fn test_record_written_to_calendar_path() {
        let dir = TempDir::new().unwrap();
        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        persist.on_record_ready(&sample_record("&-2hello&r"), "").await;

        let written = std::fs::read_to_string(dir.path().join("2023/03/07.log")).unwrap();
        assert_eq!(written, "2023-03-07 10:00:00 : hello\n");
        assert!(side.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_suffixed_record_written_to_both_files() {
        let dir = TempDir::new().unwrap();
        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        persist
            .on_record_ready(&sample_record("boom"), LogKind::Error.file_suffix())
            .await;

        let day = std::fs::read_to_string(dir.path().join("2023/03/07.log")).unwrap();
        let errors = std::fs::read_to_string(dir.path().join("2023/03/07.error.log")).unwrap();
        assert_eq!(day, errors);
        assert!(day.contains("boom"));
    }

    #[tokio::test]
    async fn test_latest_log_round_trip() {
        let dir = TempDir::new().unwrap();
        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        persist.on_record_ready(&sample_record("one"), "").await;
        persist.on_record_ready(&sample_record("two"), "").await;

        let lines = persist.latest_log().await;
        assert_eq!(
            lines,
            vec![
                "2023-03-07 10:00:00 : one",
                "2023-03-07 10:00:00 : two"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_file_degrades_to_empty_with_side_entry() {
        let dir = TempDir::new().unwrap();
        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        let lines = persist.latest_log().await;
        assert!(lines.is_empty());

        let entries = side.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, LogKind::Error);
    }

    #[tokio::test]
    async fn test_out_of_range_day_falls_back_with_warning() {
        let dir = TempDir::new().unwrap();
        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        persist.on_record_ready(&sample_record("today"), "").await;

        let lines = persist.log_by_day(Some(99), None, None).await;
        assert_eq!(lines, vec!["2023-03-07 10:00:00 : today"]);

        let entries = side.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, LogKind::Warn);
        assert!(entries[0].1.contains("out of range"));
    }

    #[tokio::test]
    async fn test_omitted_day_reads_current_day() {
        let dir = TempDir::new().unwrap();
        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        persist.on_record_ready(&sample_record("current"), "").await;

        let lines = persist.log_by_day(None, None, None).await;
        assert_eq!(lines.len(), 1);
        assert!(side.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logs_by_month_keeps_numeric_day_files_only() {
        let dir = TempDir::new().unwrap();
        let month_dir = dir.path().join("2023/03");
        std::fs::create_dir_all(&month_dir).unwrap();
        std::fs::write(month_dir.join("05.log"), "day five\n").unwrap();
        std::fs::write(month_dir.join("07.log"), "day seven\n").unwrap();
        std::fs::write(month_dir.join("notanumber.log"), "ignored\n").unwrap();
        std::fs::write(month_dir.join("07.error.log"), "ignored\n").unwrap();

        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        let by_day = persist.logs_by_month(Some(3), Some(2023)).await;
        assert_eq!(by_day.keys().copied().collect::<Vec<_>>(), vec![5, 7]);
        assert_eq!(by_day[&5], vec!["day five"]);
        assert_eq!(by_day[&7], vec!["day seven"]);
    }

    #[tokio::test]
    async fn test_logs_by_year_aggregates_numeric_month_dirs() {
        let dir = TempDir::new().unwrap();
        for (month, day) in [("01", "02"), ("03", "07")] {
            let month_dir = dir.path().join("2023").join(month);
            std::fs::create_dir_all(&month_dir).unwrap();
            std::fs::write(month_dir.join(format!("{day}.log")), "line\n").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("2023/scratch")).unwrap();

        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        let by_month = persist.logs_by_year(Some(2023)).await;
        assert_eq!(by_month.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(by_month[&1][&2], vec!["line"]);
        assert_eq!(by_month[&3][&7], vec!["line"]);
    }

    #[tokio::test]
    async fn test_missing_month_dir_degrades_to_empty_mapping() {
        let dir = TempDir::new().unwrap();
        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(dir.path(), Arc::clone(&side));

        let by_day = persist.logs_by_month(Some(11), Some(2020)).await;
        assert!(by_day.is_empty());
        assert_eq!(side.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_root_extension_stripped() {
        let side = Arc::new(CollectingSideLog::default());
        let persist = persistence(Path::new("logs/app.log"), side);
        assert_eq!(persist.root(), Path::new("logs/app"));
    }
}
