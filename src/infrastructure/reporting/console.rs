use crate::domain::ports::ReportSink;

/// Prints report output to stdout
#[derive(Debug, Default)]
pub struct ConsoleReport;

impl ReportSink for ConsoleReport {
    fn heading(&mut self, title: &str) {
        println!();
        println!("=== {} ===", title);
    }

    fn line(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Keeps report output in memory
#[derive(Debug, Default, Clone)]
pub struct BufferedReport {
    lines: Vec<String>,
}

impl BufferedReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }
}

impl ReportSink for BufferedReport {
    fn heading(&mut self, title: &str) {
        self.lines.push(format!("=== {} ===", title));
    }

    fn line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_report_collects_table() {
        let mut report = BufferedReport::new();
        report.heading("Closing prices");
        report.table(&["Asset", "Mean"], &[vec!["ETH".to_string(), "1800.00".to_string()]]);

        assert_eq!(report.lines()[0], "=== Closing prices ===");
        assert_eq!(report.lines().len(), 4);
        assert!(report.contains("ETH    1800.00"));
        assert!(report.into_text().starts_with("=== Closing prices ==="));
    }
}
