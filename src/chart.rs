use std::fmt::Display;
use std::path::Path;

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, FontTransform};
use tracing::debug;

use crate::aggregate::{self, Aggregates};
use crate::error::ReportError;
use crate::models::{ReportConfig, StudentRecord};

pub const STACKED_CHART_FILE: &str = "chart-stacked-total.png";
pub const SUBJECT_CHART_FILE: &str = "chart-subject-thresholds.png";

fn render_err(error: impl Display) -> ReportError {
    ReportError::Render(error.to_string())
}

// Rotates 90 degrees of hue per subject, matching the stacked palette of
// the original report.
fn subject_fill(subject_idx: usize) -> HSLColor {
    HSLColor(((subject_idx * 90) % 360) as f64 / 360.0, 0.7, 0.6)
}

/// One stacked bar per student, one segment per subject. Student names on
/// the x axis carry the high/low scorer marker.
pub fn render_stacked_totals(
    path: &Path,
    students: &[StudentRecord],
    aggregates: &Aggregates,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let dims = &config.chart;
    let root =
        BitMapBackend::new(path, (dims.width, dims.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    if students.is_empty() {
        root.draw(&Text::new(
            "No student rows to chart",
            (50, 40),
            ("sans-serif", 18).into_font().color(&BLACK),
        ))
        .map_err(render_err)?;
        root.present().map_err(render_err)?;
        return Ok(());
    }

    let labels: Vec<String> = students
        .iter()
        .zip(&aggregates.totals)
        .map(|(student, &total)| aggregate::label_for(&student.name, total, &config.thresholds))
        .collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Total Marks Distribution (Stacked by Subject)",
            ("sans-serif", 18).into_font().style(FontStyle::Bold),
        )
        .margin(10)
        .x_label_area_size(140)
        .y_label_area_size(60)
        .build_cartesian_2d((0..students.len()).into_segmented(), 0f64..dims.max_total)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(students.len())
        .x_label_formatter(&|seg| match seg {
            SegmentValue::CenterOf(idx) => labels.get(*idx).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_desc(format!(
            "Total Marks (out of {})",
            aggregate::fmt_mark(dims.max_total)
        ))
        .draw()
        .map_err(render_err)?;

    let value_style = ("sans-serif", 12)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (subject_idx, subject) in config.subjects.iter().enumerate() {
        let fill = subject_fill(subject_idx);

        let mut bars = Vec::with_capacity(students.len());
        for (student_idx, student) in students.iter().enumerate() {
            let base: f64 = student.scores[..subject_idx].iter().sum();
            let score = student.scores[subject_idx];
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(student_idx), base),
                    (SegmentValue::Exact(student_idx + 1), base + score),
                ],
                fill.filled(),
            );
            bar.set_margin(0, 0, 5, 5);
            bars.push(bar);
        }

        chart
            .draw_series(bars)
            .map_err(render_err)?
            .label(subject.clone())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill.filled())
            });

        // per-segment mark values, centered in each stacked block
        chart
            .draw_series(students.iter().enumerate().map(|(student_idx, student)| {
                let base: f64 = student.scores[..subject_idx].iter().sum();
                let score = student.scores[subject_idx];
                Text::new(
                    aggregate::fmt_mark(score),
                    (SegmentValue::CenterOf(student_idx), base + score / 2.0),
                    value_style.clone(),
                )
            }))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    let note_style = ("sans-serif", 14)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK);
    root.draw(&Text::new(
        format!(
            "* High Scorer (> {} total marks)",
            aggregate::fmt_mark(config.thresholds.total_high)
        ),
        (50, 40),
        note_style.clone(),
    ))
    .map_err(render_err)?;
    root.draw(&Text::new(
        format!(
            "! Low Scorer (< {} total marks)",
            aggregate::fmt_mark(config.thresholds.total_low)
        ),
        (50, 60),
        note_style,
    ))
    .map_err(render_err)?;

    root.present().map_err(render_err)?;
    debug!(chart = %path.display(), "rendered stacked totals chart");
    Ok(())
}

/// Per subject, a grouped pair of bars: students above the subject high
/// cutoff on the left, students below the low cutoff on the right.
pub fn render_subject_thresholds(
    path: &Path,
    aggregates: &Aggregates,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let dims = &config.chart;
    let thresholds = &config.thresholds;
    let root =
        BitMapBackend::new(path, (dims.width, dims.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let max_count = aggregates
        .above_counts
        .iter()
        .chain(&aggregates.below_counts)
        .max()
        .copied()
        .unwrap_or(0)
        .max(1);
    let y_max = max_count as f64 * 1.15;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Subject-wise Student Count (Above {} / Below {})",
                aggregate::fmt_mark(thresholds.subject_high),
                aggregate::fmt_mark(thresholds.subject_low)
            ),
            ("sans-serif", 18).into_font().style(FontStyle::Bold),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..config.subjects.len()).into_segmented(), 0f64..y_max)
        .map_err(render_err)?;

    let subjects = &config.subjects;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(subjects.len())
        .x_label_formatter(&|seg| match seg {
            SegmentValue::CenterOf(idx) => subjects.get(*idx).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc("Number of Students")
        .y_label_formatter(&|count| format!("{count:.0}"))
        .draw()
        .map_err(render_err)?;

    let above_fill = RGBColor(0, 200, 200).mix(0.6);
    let below_fill = RGBColor(255, 99, 132).mix(0.6);

    let mut above_bars = Vec::with_capacity(subjects.len());
    let mut below_bars = Vec::with_capacity(subjects.len());
    for idx in 0..subjects.len() {
        // left half of the segment for above, right half for below
        let mut above = Rectangle::new(
            [
                (SegmentValue::Exact(idx), 0.0),
                (SegmentValue::CenterOf(idx), aggregates.above_counts[idx] as f64),
            ],
            above_fill.filled(),
        );
        above.set_margin(0, 0, 10, 2);
        above_bars.push(above);

        let mut below = Rectangle::new(
            [
                (SegmentValue::CenterOf(idx), 0.0),
                (SegmentValue::Exact(idx + 1), aggregates.below_counts[idx] as f64),
            ],
            below_fill.filled(),
        );
        below.set_margin(0, 0, 2, 10);
        below_bars.push(below);
    }

    chart
        .draw_series(above_bars)
        .map_err(render_err)?
        .label(format!(
            "Above {}",
            aggregate::fmt_mark(thresholds.subject_high)
        ))
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 12, y + 5)], above_fill.filled())
        });

    chart
        .draw_series(below_bars)
        .map_err(render_err)?
        .label(format!(
            "Below {}",
            aggregate::fmt_mark(thresholds.subject_low)
        ))
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 12, y + 5)], below_fill.filled())
        });

    let above_label_style = ("sans-serif", 14)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Bottom));
    let below_label_style = above_label_style.pos(Pos::new(HPos::Left, VPos::Bottom));

    chart
        .draw_series((0..subjects.len()).map(|idx| {
            Text::new(
                format!("{}", aggregates.above_counts[idx]),
                (SegmentValue::CenterOf(idx), aggregates.above_counts[idx] as f64),
                above_label_style.clone(),
            )
        }))
        .map_err(render_err)?;
    chart
        .draw_series((0..subjects.len()).map(|idx| {
            Text::new(
                format!("{}", aggregates.below_counts[idx]),
                (SegmentValue::CenterOf(idx), aggregates.below_counts[idx] as f64),
                below_label_style.clone(),
            )
        }))
        .map_err(render_err)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    debug!(chart = %path.display(), "rendered subject threshold chart");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;

    fn sample() -> (Vec<StudentRecord>, ReportConfig) {
        let students = vec![
            StudentRecord {
                name: "Avery".to_string(),
                scores: vec![95.0, 95.0, 95.0, 95.0],
            },
            StudentRecord {
                name: "Jules".to_string(),
                scores: vec![10.0, 10.0, 10.0, 10.0],
            },
            StudentRecord {
                name: "Kiara".to_string(),
                scores: vec![60.0, 72.0, 55.0, 81.0],
            },
        ];
        (students, ReportConfig::default())
    }

    #[test]
    fn stacked_chart_writes_png() {
        let (students, config) = sample();
        let aggregates = aggregate(&students, &config);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STACKED_CHART_FILE);

        render_stacked_totals(&path, &students, &aggregates, &config).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn subject_chart_writes_png() {
        let (students, config) = sample();
        let aggregates = aggregate(&students, &config);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUBJECT_CHART_FILE);

        render_subject_thresholds(&path, &aggregates, &config).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn stacked_chart_tolerates_empty_input() {
        let config = ReportConfig::default();
        let aggregates = aggregate(&[], &config);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STACKED_CHART_FILE);

        render_stacked_totals(&path, &[], &aggregates, &config).unwrap();
        assert!(path.exists());
    }
}
