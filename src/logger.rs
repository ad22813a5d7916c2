//! Dispatcher
//!
//! Turns a logging call into a finished record: renders the markup to the
//! console, appends to the bounded history, notifies subscribers, and hands
//! the record to file persistence. Console output and the history append are
//! synchronous; the file write is fire-and-forget on the async runtime, so
//! two back-to-back calls have no guaranteed completion order on disk.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tokio::sync::broadcast;

use crate::error::TintError;
use crate::history::{HistoryBuffer, DEFAULT_CAPACITY};
use crate::markup::MarkupFormatter;
use crate::palette::Palette;
use crate::persist::{FilePersistence, SideLog};
use crate::record::{LogKind, LogRecord, LogValue};
use crate::storage::FsStorage;

/// Prefix generator, sampled once per record
pub type PrefixFn = Box<dyn Fn() -> String + Send + Sync>;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Named notification channels. Every notifying call fires on `Log`; the
/// kind helpers additionally fire on their own channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Log,
    Info,
    Debug,
    Warn,
    Error,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Log => "log",
            Channel::Info => "info",
            Channel::Debug => "debug",
            Channel::Warn => "warn",
            Channel::Error => "error",
        }
    }
}

/// A finished record delivered to subscribers
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub channel: Channel,
    pub record: LogRecord,
}

/// Logger setup
pub struct LoggerOptions {
    /// Prefix generator; defaults to the current timestamp
    pub prefix: Option<PrefixFn>,
    /// Text between prefix and message
    pub separator: String,
    /// History capacity
    pub capacity: usize,
    /// Style table for console rendering
    pub palette: Palette,
    /// Root directory for file persistence; no files are written when unset
    pub dir_path: Option<PathBuf>,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            separator: " : ".to_string(),
            capacity: DEFAULT_CAPACITY,
            palette: Palette::default(),
            dir_path: None,
        }
    }
}

fn default_prefix() -> PrefixFn {
    Box::new(|| Utc::now().format("%Y-%m-%d %H:%M:%S").to_string())
}

struct Inner {
    prefix: PrefixFn,
    separator: String,
    formatter: MarkupFormatter,
    history: Mutex<HistoryBuffer>,
    events: broadcast::Sender<LogEvent>,
    persistence: Option<Arc<FilePersistence>>,
}

impl Inner {
    /// Shared pipeline for both entry points: console, optional
    /// notifications, history.
    fn dispatch(&self, kind: LogKind, values: Vec<LogValue>, notify: bool) -> LogRecord {
        let record = LogRecord::new((self.prefix)(), self.separator.clone(), kind, &values);

        println!(
            "{}{}{}",
            record.prefix(),
            record.separator(),
            record.format(&self.formatter)
        );

        if notify {
            let _ = self.events.send(LogEvent {
                channel: Channel::Log,
                record: record.clone(),
            });
            self.notify_persistence(&record);
        }

        if let Ok(mut history) = self.history.lock() {
            history.add(record.clone());
        }
        record
    }

    fn notify_persistence(&self, record: &LogRecord) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let persistence = Arc::clone(persistence);
                let record = record.clone();
                let suffix = record.kind().file_suffix();
                handle.spawn(async move {
                    persistence.on_record_ready(&record, suffix).await;
                });
            }
            Err(_) => {
                self.side_entry(
                    LogKind::Warn,
                    "no async runtime available, skipping the file write",
                );
            }
        }
    }

    /// Non-notifying entry with the kind's console tag prepended.
    fn side_entry(&self, kind: LogKind, message: &str) {
        let mut values = Vec::new();
        let tag = kind.console_tag();
        if !tag.is_empty() {
            values.push(LogValue::Text(tag.to_string()));
        }
        values.push(LogValue::Text(message.to_string()));
        self.dispatch(kind, values, false);
    }
}

/// Failure funnel handed to persistence. Holds the logger weakly: persistence
/// outliving the logger simply drops its reports.
struct SideLogHandle {
    inner: Weak<Inner>,
}

impl SideLog for SideLogHandle {
    fn side_log(&self, kind: LogKind, message: &str) {
        if let Some(inner) = self.inner.upgrade() {
            inner.side_entry(kind, message);
        }
    }
}

/// Process-local logger: console with inline markup, bounded history, and
/// optional calendar-partitioned files. Cheap to clone and share.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl Logger {
    pub fn new(options: LoggerOptions) -> Result<Self, TintError> {
        let history = HistoryBuffer::new(options.capacity)?;
        let prefix = options.prefix.unwrap_or_else(default_prefix);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let persistence = options.dir_path.map(|root| {
                Arc::new(FilePersistence::new(
                    root,
                    Arc::new(FsStorage),
                    Arc::new(SideLogHandle {
                        inner: weak.clone(),
                    }),
                ))
            });
            Inner {
                prefix,
                separator: options.separator,
                formatter: MarkupFormatter::new(options.palette),
                history: Mutex::new(history),
                events,
                persistence,
            }
        });
        Ok(Self { inner })
    }

    /// Log under a kind given by its tag. An unrecognized tag is folded into
    /// the message and the record falls back to the untagged kind.
    pub fn log<I>(&self, kind_tag: &str, parts: I) -> LogRecord
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        let (kind, values) = self.resolve(kind_tag, parts);
        self.inner.dispatch(kind, values, true)
    }

    /// Same console and history path as `log`, but fires no subscriber event
    /// and writes no file. Use this when logging from inside a subscriber,
    /// otherwise the handler's own log re-enters the handler.
    pub fn event_log<I>(&self, kind_tag: &str, parts: I) -> LogRecord
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        let (kind, values) = self.resolve(kind_tag, parts);
        self.inner.dispatch(kind, values, false)
    }

    pub fn info<I>(&self, parts: I) -> LogRecord
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        self.tagged(LogKind::Info, Channel::Info, parts)
    }

    pub fn debug<I>(&self, parts: I) -> LogRecord
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        self.tagged(LogKind::Debug, Channel::Debug, parts)
    }

    pub fn warn<I>(&self, parts: I) -> LogRecord
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        self.tagged(LogKind::Warn, Channel::Warn, parts)
    }

    pub fn error<I>(&self, parts: I) -> LogRecord
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        self.tagged(LogKind::Error, Channel::Error, parts)
    }

    /// Receive every notifying record as it is finished.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.inner.events.subscribe()
    }

    /// Run a closure against the history under its lock.
    pub fn with_history<T: Default>(&self, f: impl FnOnce(&mut HistoryBuffer) -> T) -> T {
        self.inner
            .history
            .lock()
            .map(|mut history| f(&mut history))
            .unwrap_or_default()
    }

    /// Snapshot of the retained records, oldest first.
    pub fn recent(&self) -> Vec<LogRecord> {
        self.with_history(|history| history.to_vec())
    }

    /// File persistence, when a root directory was configured.
    pub fn persistence(&self) -> Option<Arc<FilePersistence>> {
        self.inner.persistence.clone()
    }

    /// Current prefix text, freshly sampled.
    pub fn prefix(&self) -> String {
        (self.inner.prefix)()
    }

    pub fn separator(&self) -> &str {
        &self.inner.separator
    }

    fn resolve<I>(&self, kind_tag: &str, parts: I) -> (LogKind, Vec<LogValue>)
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        let mut values: Vec<LogValue> = parts.into_iter().map(Into::into).collect();
        match LogKind::from_tag(kind_tag) {
            Some(kind) => (kind, values),
            None => {
                values.insert(0, LogValue::Text(kind_tag.to_string()));
                (LogKind::None, values)
            }
        }
    }

    fn tagged<I>(&self, kind: LogKind, channel: Channel, parts: I) -> LogRecord
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        let mut values = vec![LogValue::Text(kind.console_tag().to_string())];
        values.extend(parts.into_iter().map(Into::into));
        let record = self.inner.dispatch(kind, values, true);
        let _ = self.inner.events.send(LogEvent {
            channel,
            record: record.clone(),
        });
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_logger() -> Logger {
        Logger::new(LoggerOptions {
            prefix: Some(Box::new(|| ">".to_string())),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = Logger::new(LoggerOptions {
            capacity: 0,
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_unrecognized_tag_folds_into_message() {
        let logger = test_logger();
        let record = logger.log("hello there", ["friend"]);
        assert_eq!(record.kind(), LogKind::None);
        assert_eq!(record.clean(), "hello there friend");
    }

    #[test]
    fn test_recognized_tag_sets_kind() {
        let logger = test_logger();
        let record = logger.log("debug", ["details"]);
        assert_eq!(record.kind(), LogKind::Debug);
        assert_eq!(record.clean(), "details");
    }

    #[test]
    fn test_kind_helpers_prepend_console_tag() {
        let logger = test_logger();
        let record = logger.info(["service up"]);
        assert_eq!(record.kind(), LogKind::Info);
        assert_eq!(record.clean(), "[INFO] service up");

        let record = logger.error(["service down"]);
        assert_eq!(record.clean(), "[ERROR] service down");
    }

    #[test]
    fn test_records_land_in_history() {
        let logger = test_logger();
        logger.log("none", ["one"]);
        logger.warn(["two"]);

        let recent = logger.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].clean(), "one");
        assert_eq!(recent[1].clean(), "[WARN] two");
    }

    #[tokio::test]
    async fn test_subscribers_see_log_then_kind_channel() {
        let logger = test_logger();
        let mut events = logger.subscribe();

        logger.info(["hello"]);

        let first = events.try_recv().unwrap();
        assert_eq!(first.channel, Channel::Log);
        let second = events.try_recv().unwrap();
        assert_eq!(second.channel, Channel::Info);
        assert_eq!(second.record.clean(), "[INFO] hello");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_event_log_is_silent() {
        let logger = test_logger();
        let mut events = logger.subscribe();

        logger.event_log("warn", ["quiet"]);
        assert!(events.try_recv().is_err());

        // the record still reaches console and history
        assert_eq!(logger.recent().len(), 1);
    }

    #[tokio::test]
    async fn test_persisted_record_readable_from_todays_file() {
        let dir = TempDir::new().unwrap();
        let logger = Logger::new(LoggerOptions {
            prefix: Some(Box::new(|| ">".to_string())),
            dir_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        logger.info(["made it to disk"]);

        let persistence = logger.persistence().unwrap();
        let mut lines = Vec::new();
        for _ in 0..50 {
            lines = persistence.latest_log().await;
            if !lines.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(lines, vec!["> : [INFO] made it to disk".to_string()]);
    }

    #[tokio::test]
    async fn test_alert_records_write_suffixed_files() {
        let dir = TempDir::new().unwrap();
        let logger = Logger::new(LoggerOptions {
            prefix: Some(Box::new(|| ">".to_string())),
            dir_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        logger.error(["boom"]);

        let mut suffixed = Vec::new();
        for _ in 0..50 {
            suffixed = find_files_with_suffix(dir.path(), ".error.log");
            if !suffixed.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(suffixed.len(), 1);
    }

    fn find_files_with_suffix(root: &std::path::Path, suffix: &str) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.to_string_lossy().ends_with(suffix) {
                    found.push(path);
                }
            }
        }
        found
    }
}
