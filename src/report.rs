use std::fmt::Write;

use crate::aggregate::{self, Aggregates};
use crate::models::{ReportConfig, StudentRecord};

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

/// Builds the text summary printed to the console and written to the
/// report file. Deterministic for identical inputs.
pub fn build_summary(
    students: &[StudentRecord],
    aggregates: &Aggregates,
    config: &ReportConfig,
) -> String {
    let mut output = String::new();
    let thresholds = &config.thresholds;

    let _ = writeln!(output, "# Student Marks Summary");
    let _ = writeln!(
        output,
        "{} students across {} subjects ({})",
        students.len(),
        config.subjects.len(),
        config.subjects.join(", ")
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Total Scorers");
    let _ = writeln!(
        output,
        "Students scoring above {}: {}",
        aggregate::fmt_mark(thresholds.total_high),
        aggregates.high_scorers.len()
    );
    let _ = writeln!(output, "  > {}", join_or_none(&aggregates.high_scorers));
    let _ = writeln!(
        output,
        "Students scoring below {}: {}",
        aggregate::fmt_mark(thresholds.total_low),
        aggregates.low_scorers.len()
    );
    let _ = writeln!(output, "  > {}", join_or_none(&aggregates.low_scorers));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subject Thresholds");
    for (idx, subject) in config.subjects.iter().enumerate() {
        let _ = writeln!(
            output,
            "- {}: {} above {}, {} below {}",
            subject,
            aggregates.above_counts[idx],
            aggregate::fmt_mark(thresholds.subject_high),
            aggregates.below_counts[idx],
            aggregate::fmt_mark(thresholds.subject_low)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Per-Student Totals");
    if students.is_empty() {
        let _ = writeln!(output, "No student rows in the input.");
    } else {
        for (student, &total) in students.iter().zip(&aggregates.totals) {
            let _ = writeln!(
                output,
                "- {}: total {}, average {:.1}",
                aggregate::label_for(&student.name, total, thresholds),
                aggregate::fmt_mark(total),
                aggregate::average(total, config.subjects.len())
            );
        }
    }

    output
}
