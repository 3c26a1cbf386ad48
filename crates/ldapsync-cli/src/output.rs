/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    /// A titled list, one line per item
    fn list(&self, title: &str, items: &[String]);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output with checkmarks and indentation
///
/// In quiet mode only errors and warnings are printed.
pub struct HumanFormatter {
    quiet: bool,
}

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        if !self.quiet {
            println!("\u{2713} {}", message);
        }
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
    fn list(&self, title: &str, items: &[String]) {
        if self.quiet || items.is_empty() {
            return;
        }
        println!("  {} ({}):", title, items.len());
        for item in items {
            println!("    - {}", item);
        }
    }
    fn print_json(&self, _value: &serde_json::Value) {}
}

/// JSON output: one document on stdout, diagnostics on stderr
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, _message: &str) {}
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
    fn list(&self, _title: &str, _items: &[String]) {}
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
