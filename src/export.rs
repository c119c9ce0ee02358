use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::course_scraper::CourseRecord;

/// Fixed column set of the tabular output. Missing fields render as empty
/// strings.
const CSV_COLUMNS: [&str; 9] = [
    "code",
    "description",
    "year_of_data",
    "course_page_url",
    "document_path",
    "objectives",
    "prerequisites",
    "assessment",
    "error",
];

pub fn write_json(path: &Path, records: &[CourseRecord]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write results to {}", path.display()))?;
    Ok(())
}

pub fn write_csv(path: &Path, records: &[CourseRecord]) -> anyhow::Result<()> {
    let mut buf = String::new();
    push_row(&mut buf, CSV_COLUMNS.iter().copied());
    for record in records {
        push_row(&mut buf, csv_cells(record).into_iter());
    }
    fs::write(path, buf)
        .with_context(|| format!("failed to write results to {}", path.display()))?;
    Ok(())
}

fn csv_cells(record: &CourseRecord) -> [&str; 9] {
    [
        &record.query.code,
        &record.query.description,
        opt(&record.year_of_data),
        opt(&record.course_page_url),
        opt(&record.document_path),
        opt(&record.objectives),
        opt(&record.prerequisites),
        opt(&record.assessment),
        opt(&record.error),
    ]
}

fn opt(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn push_row<'a>(buf: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            buf.push(',');
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            buf.push('"');
            buf.push_str(&cell.replace('"', "\"\""));
            buf.push('"');
        } else {
            buf.push_str(cell);
        }
    }
    buf.push('\n');
}
