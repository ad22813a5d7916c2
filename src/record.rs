//! Log record value type
//!
//! A `LogRecord` is produced once per logging call and never mutated. The raw
//! markup-laden body is kept; the rendered and cleaned forms are pure
//! derivations so the same record can feed a color console and a plain file.

use chrono::{DateTime, Utc};

use crate::markup::{self, MarkupFormatter};

/// Classification tag of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Fallback when no recognized kind was supplied
    None,
    Info,
    Debug,
    Warn,
    Error,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::None => "none",
            LogKind::Info => "info",
            LogKind::Debug => "debug",
            LogKind::Warn => "warn",
            LogKind::Error => "error",
        }
    }

    /// Parse a kind tag. Unrecognized tags yield `None` so the dispatcher can
    /// fold the tag back into the message.
    pub fn from_tag(tag: &str) -> Option<LogKind> {
        match tag {
            "none" => Some(LogKind::None),
            "info" => Some(LogKind::Info),
            "debug" => Some(LogKind::Debug),
            "warn" => Some(LogKind::Warn),
            "error" => Some(LogKind::Error),
            _ => Option::None,
        }
    }

    /// Colored console tag in markup form, empty for untagged records.
    pub fn console_tag(&self) -> &'static str {
        match self {
            LogKind::None => "",
            LogKind::Info => "&_3&-0[INFO]&r&-3",
            LogKind::Debug => "&_2&-0[DEBUG]&r&-2",
            LogKind::Warn => "&_6&-0[WARN]&r&-6",
            LogKind::Error => "&_4&-0[ERROR]&r&-4",
        }
    }

    /// Filename suffix isolating the warning and error streams on disk.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            LogKind::Warn => ".warn",
            LogKind::Error => ".error",
            _ => "",
        }
    }

    /// Check if this kind is a warning or error
    pub fn is_alert(&self) -> bool {
        matches!(self, LogKind::Warn | LogKind::Error)
    }
}

/// A single message argument, normalized at construction.
///
/// The variants enumerate every supported argument shape; anything else is
/// unrepresentable, which makes unsupported arguments a compile error rather
/// than a runtime one.
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Text(String),
    Int(i64),
    Float(f64),
    /// A missing argument, rendered as an empty string
    Missing,
    /// An error-like argument: the stack trace wins over the message when set
    Failure {
        message: String,
        stack: Option<String>,
    },
    /// A plain object, rendered as human-readable JSON
    Object(serde_json::Value),
}

impl LogValue {
    /// Build a failure value from any error, folding its source chain into
    /// the stack text.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let message = err.to_string();
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        let stack = if causes.is_empty() {
            None
        } else {
            Some(format!("{message}\n{}", causes.join("\n")))
        };
        Self::Failure { message, stack }
    }

    /// Render this value to its text form.
    pub fn render(&self) -> String {
        match self {
            LogValue::Text(text) => text.clone(),
            LogValue::Int(n) => n.to_string(),
            LogValue::Float(n) => n.to_string(),
            LogValue::Missing => String::new(),
            LogValue::Failure { message, stack } => {
                stack.clone().unwrap_or_else(|| message.clone())
            }
            LogValue::Object(value) => serde_json::to_string_pretty(value)
                .unwrap_or_else(|_| value.to_string()),
        }
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for LogValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for LogValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<LogValue>> From<Option<T>> for LogValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            Option::None => Self::Missing,
        }
    }
}

/// Immutable record of one logging call
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    prefix: String,
    separator: String,
    kind: LogKind,
    body: String,
    created_at: DateTime<Utc>,
}

impl LogRecord {
    /// Build a record from normalized parts. Parts are rendered and joined
    /// with single spaces, and a trailing reset token closes any styling the
    /// message left open.
    pub fn new(
        prefix: impl Into<String>,
        separator: impl Into<String>,
        kind: LogKind,
        parts: &[LogValue],
    ) -> Self {
        let mut body = parts
            .iter()
            .map(LogValue::render)
            .collect::<Vec<_>>()
            .join(" ");
        body.push_str("&r");

        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            kind,
            body,
            created_at: Utc::now(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn kind(&self) -> LogKind {
        self.kind
    }

    /// Raw markup-laden body
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Body with markup rendered to ANSI through the given formatter.
    pub fn format(&self, formatter: &MarkupFormatter) -> String {
        formatter.format(&self.body)
    }

    /// Body with all markup and ANSI sequences stripped.
    pub fn clean(&self) -> String {
        markup::clean(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;

    #[test]
    fn test_body_normalization() {
        let record = LogRecord::new(
            ">",
            " : ",
            LogKind::Info,
            &[
                LogValue::from("A"),
                LogValue::from(5),
                LogValue::Missing,
                LogValue::from("B"),
            ],
        );
        assert_eq!(record.body(), "A 5  B&r");
        assert_eq!(record.prefix(), ">");
        assert_eq!(record.separator(), " : ");
        assert_eq!(record.kind(), LogKind::Info);
    }

    #[test]
    fn test_empty_parts_yield_bare_reset() {
        let record = LogRecord::new("p", " ", LogKind::None, &[]);
        assert_eq!(record.body(), "&r");
        assert_eq!(record.clean(), "");
    }

    #[test]
    fn test_float_and_int_rendering() {
        assert_eq!(LogValue::from(5).render(), "5");
        assert_eq!(LogValue::from(5.5).render(), "5.5");
        assert_eq!(LogValue::from(5.0).render(), "5");
    }

    #[test]
    fn test_option_arguments() {
        assert_eq!(LogValue::from(Option::<&str>::None).render(), "");
        assert_eq!(LogValue::from(Some("x")).render(), "x");
    }

    #[test]
    fn test_failure_prefers_stack() {
        let with_stack = LogValue::Failure {
            message: "broke".to_string(),
            stack: Some("broke\nat main".to_string()),
        };
        assert_eq!(with_stack.render(), "broke\nat main");

        let plain = LogValue::Failure {
            message: "broke".to_string(),
            stack: Option::None,
        };
        assert_eq!(plain.render(), "broke");
    }

    #[test]
    fn test_from_error_without_source() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let value = LogValue::from_error(&err);
        assert_eq!(value.render(), "missing");
    }

    #[test]
    fn test_object_rendering() {
        let value = LogValue::from(serde_json::json!({ "port": 8080 }));
        let rendered = value.render();
        assert!(rendered.contains("\"port\": 8080"));
    }

    #[test]
    fn test_format_and_clean_derive_from_body() {
        let formatter = MarkupFormatter::new(Palette::default());
        let record = LogRecord::new("", "", LogKind::None, &[LogValue::from("&-2ok")]);
        assert_eq!(record.format(&formatter), "\u{1b}[32mok\u{1b}[0m");
        assert_eq!(record.clean(), "ok");
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(LogKind::from_tag("info"), Some(LogKind::Info));
        assert_eq!(LogKind::from_tag("none"), Some(LogKind::None));
        assert_eq!(LogKind::from_tag("INFO"), Option::None);
        assert_eq!(LogKind::from_tag("verbose"), Option::None);
    }

    #[test]
    fn test_kind_file_suffix() {
        assert_eq!(LogKind::Warn.file_suffix(), ".warn");
        assert_eq!(LogKind::Error.file_suffix(), ".error");
        assert_eq!(LogKind::Info.file_suffix(), "");
        assert!(LogKind::Error.is_alert());
        assert!(!LogKind::Info.is_alert());
    }
}
