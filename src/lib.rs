//! tintlog - console logging with inline color markup
//!
//! A process-local logger: messages carry `&`-prefixed color/style tokens
//! rendered to ANSI on the console, a bounded in-memory history keeps the
//! most recent records, and an optional persistence layer appends cleaned
//! (markup-stripped) lines to calendar-partitioned files with read-back by
//! day, month, or year.

pub mod error;
pub mod history;
pub mod logger;
pub mod markup;
pub mod palette;
pub mod persist;
pub mod record;
pub mod storage;

pub use error::TintError;
pub use history::{HistoryBuffer, KeyOrRecord};
pub use logger::{Channel, LogEvent, Logger, LoggerOptions, PrefixFn};
pub use markup::{clean, MarkupFormatter};
pub use palette::Palette;
pub use persist::{CalendarDay, Clock, FilePersistence, LocalClock, SideLog};
pub use record::{LogKind, LogRecord, LogValue};
pub use storage::{FsStorage, Storage};
