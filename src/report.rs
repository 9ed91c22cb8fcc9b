/*!
 * Reporting functionality for repo-serializer
 *
 * Summarizes a run as a table using the tabled library.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::Mode;

/// Counters gathered during one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Mode the run used
    pub mode: Mode,
    /// Directories listed in the structure
    pub directories: usize,
    /// Files listed in the structure
    pub files: usize,
    /// File blocks written to the content section
    pub blocks: usize,
    /// Files replaced by the binary placeholder
    pub binary_skipped: usize,
    /// Files cut at the size or preview limit
    pub truncated: usize,
    /// Entries reported as unreadable
    pub unreadable: usize,
    /// Prompt fragments extracted
    pub prompt_fragments: usize,
    /// Size of the written document
    pub bytes_written: usize,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Report generator for run statistics
pub struct Reporter;

impl Reporter {
    /// Format a number with human-readable units
    fn format_number(num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate the summary table
    pub fn generate_report(stats: &RunStats, output_file: &str, duration: Duration) -> String {
        let mut rows = vec![
            Row {
                metric: "Output",
                value: output_file.to_string(),
            },
            Row {
                metric: "Mode",
                value: stats.mode.to_string(),
            },
            Row {
                metric: "Directories",
                value: Self::format_number(stats.directories),
            },
            Row {
                metric: "Files listed",
                value: Self::format_number(stats.files),
            },
        ];

        if stats.blocks > 0 {
            rows.push(Row {
                metric: "File blocks",
                value: Self::format_number(stats.blocks),
            });
        }

        let optional = [
            ("Binary skipped", stats.binary_skipped),
            ("Truncated", stats.truncated),
            ("Unreadable", stats.unreadable),
            ("Prompt fragments", stats.prompt_fragments),
        ];
        rows.extend(
            optional
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .map(|(metric, count)| Row {
                    metric,
                    value: Self::format_number(count),
                }),
        );

        rows.push(Row {
            metric: "Size",
            value: format_size(stats.bytes_written as u64),
        });
        rows.push(Row {
            metric: "Duration",
            value: format!("{:.2?}", duration),
        });

        Table::new(rows)
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
            .to_string()
    }

    /// Print the report to stdout
    pub fn print_report(stats: &RunStats, output_file: &str, duration: Duration) {
        println!("\n{}", Self::generate_report(stats, output_file, duration));
    }
}

/// Format a human-readable file size
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(Reporter::format_number(999), "999");
        assert_eq!(Reporter::format_number(1_500), "1.5K");
        assert_eq!(Reporter::format_number(2_000_000), "2.0M");
    }

    #[test]
    fn test_report_hides_zero_counters() {
        let stats = RunStats {
            files: 3,
            directories: 1,
            blocks: 3,
            truncated: 1,
            bytes_written: 100,
            ..RunStats::default()
        };
        let report = Reporter::generate_report(&stats, "out.txt", Duration::from_millis(5));
        assert!(report.contains("out.txt"));
        assert!(report.contains("Truncated"));
        assert!(report.contains("full content"));
        assert!(!report.contains("Binary skipped"));
        assert!(!report.contains("Prompt fragments"));
    }
}
