use std::fmt::Display;
use std::path::Path;

use calamine::{open_workbook_auto, DataType, Reader};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::aggregate::fmt_mark;
use crate::error::ReportError;
use crate::models::{ReportConfig, StudentRecord};

fn input_err(path: &Path, message: impl Display) -> ReportError {
    ReportError::InputRead {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Dispatches on file extension: `.csv` or a spreadsheet (`.xlsx`/`.xls`).
pub fn load_students(
    path: &Path,
    config: &ReportConfig,
) -> Result<Vec<StudentRecord>, ReportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let students = match ext.as_str() {
        "csv" => read_csv(path, config)?,
        "xlsx" | "xls" | "ods" => read_spreadsheet(path, config)?,
        other => {
            return Err(input_err(
                path,
                format!("unsupported input extension `{other}` (expected csv or xlsx)"),
            ))
        }
    };

    debug!(
        students = students.len(),
        source = %path.display(),
        "loaded marks table"
    );
    Ok(students)
}

/// Header row must carry `Name` plus one column per configured subject;
/// extra columns are ignored. Header cells are trimmed before matching,
/// and row lookups go through the same resolved indices.
pub fn read_csv(path: &Path, config: &ReportConfig) -> Result<Vec<StudentRecord>, ReportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| input_err(path, e))?;

    let headers = reader.headers().map_err(|e| input_err(path, e))?.clone();
    let name_col = headers
        .iter()
        .position(|h| h.trim() == "Name")
        .ok_or_else(|| input_err(path, "missing `Name` column"))?;

    let mut subject_cols = Vec::with_capacity(config.subjects.len());
    for subject in &config.subjects {
        let col = headers
            .iter()
            .position(|h| h.trim() == subject.as_str())
            .ok_or_else(|| input_err(path, format!("missing subject column `{subject}`")))?;
        subject_cols.push(col);
    }

    let mut students = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| input_err(path, e))?;
        let name = row.get(name_col).map(str::trim).unwrap_or("");
        if name.is_empty() {
            return Err(input_err(path, "row with an empty Name cell"));
        }
        let name = name.to_string();

        let mut scores = Vec::with_capacity(config.subjects.len());
        for (subject, &col) in config.subjects.iter().zip(&subject_cols) {
            let raw = row.get(col).unwrap_or("").trim();
            let value: f64 = raw.parse().map_err(|_| ReportError::MissingScore {
                student: name.clone(),
                subject: subject.clone(),
            })?;
            scores.push(value);
        }
        students.push(StudentRecord { name, scores });
    }

    Ok(students)
}

/// First sheet only, same header contract as the CSV reader. Trailing
/// blank rows (no name cell) are skipped.
pub fn read_spreadsheet(
    path: &Path,
    config: &ReportConfig,
) -> Result<Vec<StudentRecord>, ReportError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| input_err(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| input_err(path, "workbook has no sheets"))?
        .map_err(|e| input_err(path, e))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| input_err(path, "first sheet is empty"))?
        .iter()
        .map(|cell| cell.as_string().unwrap_or_default().trim().to_string())
        .collect();

    let name_col = header
        .iter()
        .position(|h| h == "Name")
        .ok_or_else(|| input_err(path, "missing `Name` column"))?;

    let mut subject_cols = Vec::with_capacity(config.subjects.len());
    for subject in &config.subjects {
        let col = header
            .iter()
            .position(|h| h == subject)
            .ok_or_else(|| input_err(path, format!("missing subject column `{subject}`")))?;
        subject_cols.push(col);
    }

    let mut students = Vec::new();
    for row in rows {
        let name = row
            .get(name_col)
            .and_then(|cell| cell.as_string())
            .map(|n| n.trim().to_string())
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let mut scores = Vec::with_capacity(config.subjects.len());
        for (subject, &col) in config.subjects.iter().zip(&subject_cols) {
            let value = row
                .get(col)
                .and_then(|cell| cell.as_f64())
                .ok_or_else(|| ReportError::MissingScore {
                    student: name.clone(),
                    subject: subject.clone(),
                })?;
            scores.push(value);
        }
        students.push(StudentRecord { name, scores });
    }

    Ok(students)
}

/// Random sample marks in 0..=100 per subject. A fixed seed reproduces
/// the same table.
pub fn generate_students(
    count: usize,
    subject_count: usize,
    seed: Option<u64>,
) -> Vec<StudentRecord> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    (1..=count)
        .map(|i| StudentRecord {
            name: format!("Student {i:02}"),
            scores: (0..subject_count)
                .map(|_| rng.gen_range(0..=100) as f64)
                .collect(),
        })
        .collect()
}

/// Writes a marks table in the same shape the readers expect, so a
/// generated sample can feed every other subcommand.
pub fn write_csv(
    path: &Path,
    students: &[StudentRecord],
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| input_err(path, e))?;

    let mut header = vec!["Name".to_string()];
    header.extend(config.subjects.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| input_err(path, e))?;

    for student in students {
        let mut record = vec![student.name.clone()];
        record.extend(student.scores.iter().map(|&score| fmt_mark(score)));
        writer
            .write_record(&record)
            .map_err(|e| input_err(path, e))?;
    }

    writer.flush().map_err(|e| input_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn csv_reads_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "marks.csv",
            "Name,ADMS,AOS,A&CD,C&NS\nAvery,95,95,95,95\nJules,10,10,10,10\n",
        );

        let config = ReportConfig::default();
        let students = read_csv(&path, &config).unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name, "Avery");
        assert_eq!(students[0].scores, vec![95.0, 95.0, 95.0, 95.0]);
        assert_eq!(students[1].scores, vec![10.0, 10.0, 10.0, 10.0]);
    }

    #[test]
    fn csv_ignores_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "marks.csv",
            "Name,Roll,ADMS,AOS,A&CD,C&NS\nAvery,17,80,70,60,50\n",
        );

        let students = read_csv(&path, &ReportConfig::default()).unwrap();
        assert_eq!(students[0].scores, vec![80.0, 70.0, 60.0, 50.0]);
    }

    #[test]
    fn csv_trims_padded_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "marks.csv",
            "Name,ADMS, AOS,A&CD,C&NS\nAvery,95,80,70,60\n",
        );

        let students = read_csv(&path, &ReportConfig::default()).unwrap();
        assert_eq!(students[0].scores, vec![95.0, 80.0, 70.0, 60.0]);
    }

    #[test]
    fn csv_missing_subject_column_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "marks.csv", "Name,ADMS\nAvery,80\n");

        let err = read_csv(&path, &ReportConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::InputRead { .. }));
    }

    #[test]
    fn csv_blank_cell_names_student_and_subject() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "marks.csv",
            "Name,ADMS,AOS,A&CD,C&NS\nAvery,95,,95,95\n",
        );

        let err = read_csv(&path, &ReportConfig::default()).unwrap_err();
        match err {
            ReportError::MissingScore { student, subject } => {
                assert_eq!(student, "Avery");
                assert_eq!(subject, "AOS");
            }
            other => panic!("expected MissingScore, got {other:?}"),
        }
    }

    fn write_xlsx_fixture(path: &Path, header: &[&str], rows: &[(&str, &[f64])]) {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, cell) in header.iter().enumerate() {
            sheet.write(0, col as u16, *cell).unwrap();
        }
        for (idx, (name, scores)) in rows.iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write(row, 0, *name).unwrap();
            for (col, &score) in scores.iter().enumerate() {
                sheet.write(row, col as u16 + 1, score).unwrap();
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn xlsx_reads_first_sheet_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marks.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write(0, 0, "Name").unwrap();
        for (col, subject) in ["ADMS", "AOS", "A&CD", "C&NS"].iter().enumerate() {
            sheet.write(0, col as u16 + 1, *subject).unwrap();
        }
        sheet.write(1, 0, "Avery").unwrap();
        for col in 1..=4u16 {
            sheet.write(1, col, 95.0).unwrap();
        }
        // a second sheet with a different shape must be ignored
        let other = workbook.add_worksheet();
        other.write(0, 0, "unrelated").unwrap();
        workbook.save(&path).unwrap();

        let students = load_students(&path, &ReportConfig::default()).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Avery");
        assert_eq!(students[0].scores, vec![95.0, 95.0, 95.0, 95.0]);
    }

    #[test]
    fn xlsx_missing_subject_column_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marks.xlsx");
        write_xlsx_fixture(
            &path,
            &["Name", "ADMS", "AOS", "A&CD"],
            &[("Avery", &[95.0, 80.0, 70.0])],
        );

        let err = read_spreadsheet(&path, &ReportConfig::default()).unwrap_err();
        match err {
            ReportError::InputRead { message, .. } => assert!(message.contains("C&NS")),
            other => panic!("expected InputRead, got {other:?}"),
        }
    }

    #[test]
    fn xlsx_blank_cell_names_student_and_subject() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marks.xlsx");
        // Jules has no A&CD cell at all
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, cell) in ["Name", "ADMS", "AOS", "A&CD", "C&NS"].iter().enumerate() {
            sheet.write(0, col as u16, *cell).unwrap();
        }
        sheet.write(1, 0, "Jules").unwrap();
        sheet.write(1, 1, 40.0).unwrap();
        sheet.write(1, 2, 40.0).unwrap();
        sheet.write(1, 4, 40.0).unwrap();
        workbook.save(&path).unwrap();

        let err = read_spreadsheet(&path, &ReportConfig::default()).unwrap_err();
        match err {
            ReportError::MissingScore { student, subject } => {
                assert_eq!(student, "Jules");
                assert_eq!(subject, "A&CD");
            }
            other => panic!("expected MissingScore, got {other:?}"),
        }
    }

    #[test]
    fn xlsx_skips_rows_without_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marks.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, cell) in ["Name", "ADMS", "AOS", "A&CD", "C&NS"].iter().enumerate() {
            sheet.write(0, col as u16, *cell).unwrap();
        }
        sheet.write(1, 0, "Avery").unwrap();
        for col in 1..=4u16 {
            sheet.write(1, col, 60.0).unwrap();
        }
        // stray row with a score but no name cell
        sheet.write(2, 1, 50.0).unwrap();
        workbook.save(&path).unwrap();

        let students = read_spreadsheet(&path, &ReportConfig::default()).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Avery");
    }

    #[test]
    fn unknown_extension_rejected() {
        let config = ReportConfig::default();
        let err = load_students(Path::new("marks.parquet"), &config).unwrap_err();
        assert!(matches!(err, ReportError::InputRead { .. }));
    }

    #[test]
    fn generation_is_seed_reproducible() {
        let a = generate_students(10, 4, Some(42));
        let b = generate_students(10, 4, Some(42));
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a
            .iter()
            .all(|s| s.scores.iter().all(|&m| (0.0..=100.0).contains(&m))));
        assert_eq!(a[0].name, "Student 01");
    }

    #[test]
    fn generated_csv_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.csv");
        let config = ReportConfig::default();

        let students = generate_students(5, config.subjects.len(), Some(7));
        write_csv(&path, &students, &config).unwrap();

        let loaded = load_students(&path, &config).unwrap();
        assert_eq!(loaded, students);
    }
}
