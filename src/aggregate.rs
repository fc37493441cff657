use crate::models::{ReportConfig, StudentRecord, Thresholds};

/// Everything the rendering and reporting side consumes. `totals` is
/// parallel to the input students; the count vectors are parallel to the
/// configured subject list.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub totals: Vec<f64>,
    pub high_scorers: Vec<String>,
    pub low_scorers: Vec<String>,
    pub above_counts: Vec<usize>,
    pub below_counts: Vec<usize>,
}

pub fn compute_totals(students: &[StudentRecord]) -> Vec<f64> {
    students
        .iter()
        .map(|student| student.scores.iter().sum())
        .collect()
}

/// Floating-point division; config validation guarantees a non-empty
/// subject list before this is reached.
pub fn average(total: f64, subject_count: usize) -> f64 {
    debug_assert!(subject_count > 0);
    total / subject_count as f64
}

/// High and low are independent strict comparisons. With sane thresholds
/// (`total_low < total_high`) a student can never land in both, but the
/// checks deliberately do not assume that.
pub fn classify(
    students: &[StudentRecord],
    totals: &[f64],
    thresholds: &Thresholds,
) -> (Vec<String>, Vec<String>) {
    let mut high = Vec::new();
    let mut low = Vec::new();

    for (student, &total) in students.iter().zip(totals) {
        if total > thresholds.total_high {
            high.push(student.name.clone());
        }
        if total < thresholds.total_low {
            low.push(student.name.clone());
        }
    }

    (high, low)
}

/// Per subject index, how many students scored strictly above
/// `subject_high` and strictly below `subject_low`. Zero counts are valid
/// results, not errors.
pub fn per_subject_counts(
    students: &[StudentRecord],
    subject_count: usize,
    thresholds: &Thresholds,
) -> (Vec<usize>, Vec<usize>) {
    let mut above = vec![0usize; subject_count];
    let mut below = vec![0usize; subject_count];

    for student in students {
        for (idx, &score) in student.scores.iter().take(subject_count).enumerate() {
            if score > thresholds.subject_high {
                above[idx] += 1;
            }
            if score < thresholds.subject_low {
                below[idx] += 1;
            }
        }
    }

    (above, below)
}

/// Decorates a display name with the high/low marker. Purely
/// presentational; same inputs always produce the same string.
pub fn label_for(name: &str, total: f64, thresholds: &Thresholds) -> String {
    if total > thresholds.total_high {
        format!("* {name}")
    } else if total < thresholds.total_low {
        format!("! {name}")
    } else {
        name.to_string()
    }
}

pub fn aggregate(students: &[StudentRecord], config: &ReportConfig) -> Aggregates {
    let totals = compute_totals(students);
    let (high_scorers, low_scorers) = classify(students, &totals, &config.thresholds);
    let (above_counts, below_counts) =
        per_subject_counts(students, config.subjects.len(), &config.thresholds);

    Aggregates {
        totals,
        high_scorers,
        low_scorers,
        above_counts,
        below_counts,
    }
}

/// Marks are stored as f64 but are almost always whole numbers; print
/// them without the trailing `.0` when they are.
pub fn fmt_mark(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
