use chrono::{DateTime, Local};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Timestamp layout of status lines
const STATUS_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render one status line as `YYYY-MM-DD HH:MM:SS - message`
pub fn timestamped(time: DateTime<Local>, message: &str) -> String {
    format!("{} - {}", time.format(STATUS_TIME_FORMAT), message)
}

/// Trait for formatting CLI output
pub trait OutputFormatter: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    /// Progress line emitted while a sync is running
    fn status(&self, message: &str);
    /// Whole-percent progress while a sync is running
    fn progress(&self, percent: u8);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter with checkmarks and indentation
pub struct HumanFormatter {
    quiet: bool,
}

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
    fn status(&self, message: &str) {
        if !self.quiet {
            println!("{}", timestamped(Local::now(), message));
        }
    }
    fn progress(&self, percent: u8) {
        if !self.quiet {
            println!("{}", timestamped(Local::now(), &format!("Progress: {}%", percent)));
        }
    }
    fn print_json(&self, _value: &serde_json::Value) {
        // Human formatter doesn't print JSON
    }
}

/// JSON output formatter
///
/// Running events go to stderr as one object per line so stdout carries only
/// the final document.
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn warn(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"level": "warning", "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn status(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"event": "status", "time": Local::now().to_rfc3339(), "message": message})
        );
    }
    fn progress(&self, percent: u8) {
        eprintln!("{}", serde_json::json!({"event": "progress", "percent": percent}));
    }
    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

pub fn get_formatter(format: OutputFormat, quiet: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter { quiet }),
    }
}
