use std::fs;

use anyhow::Context;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::browser::BrowserSession;
use crate::config::{AcademicYear, CatalogueConfig};
use crate::course_list::CourseQuery;
use crate::download_watcher::DownloadWatcher;
use crate::pdf_text::{PdfTextBackend, extract_between_markers};

const OBJECTIVES_START: &str = "Course objectives and learning outcomes";
const OBJECTIVES_END: &str = "Entrance requirement";
const PREREQUISITES_START: &str = "Entrance requirement";
const PREREQUISITES_END: &str = "Contents";
const ASSESSMENT_START: &str = "Test and assessment criteria";
const ASSESSMENT_END: &str = "Bibliography/Study materials";

const DOCUMENT_SUFFIX: &str = ".pdf";

/// Everything gathered for one course. Built up attempt by attempt; the
/// same shape is persisted as the per-attempt intermediate record and as an
/// entry of the final batch output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(flatten)]
    pub query: CourseQuery,
    pub year_of_data: Option<String>,
    pub course_page_url: Option<String>,
    pub document_path: Option<String>,
    pub objectives: Option<String>,
    pub prerequisites: Option<String>,
    pub assessment: Option<String>,
    pub error: Option<String>,
}

impl CourseRecord {
    fn new(query: CourseQuery) -> Self {
        Self {
            query,
            year_of_data: None,
            course_page_url: None,
            document_path: None,
            objectives: None,
            prerequisites: None,
            assessment: None,
            error: None,
        }
    }
}

/// How one (course, year) attempt ended.
enum AttemptOutcome {
    /// The document was retrieved and the objectives section was found.
    ObjectivesFound,
    /// The document was retrieved but holds no objectives section; worth
    /// retrying against an older catalogue year.
    ObjectivesMissing,
    /// No results link for this year; try the next older one.
    LinkNotFound,
    /// The save action produced no file within the timeout. Fatal for the
    /// whole course, not just this year.
    DownloadTimedOut,
}

pub struct CourseScraper<'a> {
    pub query: CourseQuery,
    pub browser: &'a dyn BrowserSession,
    pub watcher: &'a DownloadWatcher,
    pub pdf_backend: &'a dyn PdfTextBackend,
    pub config: &'a CatalogueConfig,
}

impl CourseScraper<'_> {
    /// Run the full per-course procedure. Never fails the batch: any
    /// unexpected error ends up in the record's `error` field.
    pub async fn scrape(&self) -> CourseRecord {
        let mut record = CourseRecord::new(self.query.clone());
        if let Err(e) = self.try_years(&mut record).await {
            error!(
                "course {} ({}) failed: {e:#}",
                self.query.code, self.query.description
            );
            record.error = Some(format!("{e:#}"));
        }
        record
    }

    async fn try_years(&self, record: &mut CourseRecord) -> anyhow::Result<()> {
        self.browser.open_search_page().await?;
        self.browser.select_english_interface().await?;

        for year in self.config.candidate_years() {
            info!("selecting year {year}");
            match self.attempt_year(record, year).await? {
                AttemptOutcome::ObjectivesFound => return Ok(()),
                AttemptOutcome::ObjectivesMissing => {
                    warn!(
                        "objectives section not found for {} in {year}, trying previous year",
                        self.query.code
                    );
                }
                AttemptOutcome::LinkNotFound => {
                    warn!(
                        "could not find link for course {} - {} for year {year}",
                        self.query.code, self.query.description
                    );
                }
                AttemptOutcome::DownloadTimedOut => {
                    record.error = Some("document not downloaded".to_string());
                    return Ok(());
                }
            }
        }
        // Exhausting the year range is a soft failure; objectives simply
        // stays absent.
        Ok(())
    }

    async fn attempt_year(
        &self,
        record: &mut CourseRecord,
        year: AcademicYear,
    ) -> anyhow::Result<AttemptOutcome> {
        self.browser.open_search_page().await?;
        self.browser
            .submit_search(&self.query.description, year)
            .await?;

        let Some(link) = self.browser.find_course_link(&self.query.code).await? else {
            return Ok(AttemptOutcome::LinkNotFound);
        };
        record.course_page_url = Some(link.clone());
        self.browser.open_course_page(&link).await?;

        let before = self.watcher.snapshot()?;
        self.browser.trigger_document_save().await?;
        let Some(document_path) = self
            .watcher
            .wait_for_new_file(&before, DOCUMENT_SUFFIX, self.config.download_timeout)
            .await?
        else {
            return Ok(AttemptOutcome::DownloadTimedOut);
        };
        record.document_path = Some(document_path.display().to_string());

        let full_text = self.pdf_backend.extract_text(&document_path)?;
        record.objectives = extract_between_markers(&full_text, OBJECTIVES_START, OBJECTIVES_END);
        record.prerequisites =
            extract_between_markers(&full_text, PREREQUISITES_START, PREREQUISITES_END);
        record.assessment = extract_between_markers(&full_text, ASSESSMENT_START, ASSESSMENT_END);
        record.year_of_data = Some(year.label());

        self.write_attempt_record(record, year)?;

        if record.objectives.is_some() {
            Ok(AttemptOutcome::ObjectivesFound)
        } else {
            Ok(AttemptOutcome::ObjectivesMissing)
        }
    }

    /// Durable snapshot of the in-progress record, written after every
    /// attempt that produced a document.
    fn write_attempt_record(
        &self,
        record: &CourseRecord,
        year: AcademicYear,
    ) -> anyhow::Result<()> {
        let filename = attempt_record_filename(&self.query.code, &self.query.description, year);
        let path = self.config.output_dir.join(filename);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write attempt record {}", path.display()))?;
        Ok(())
    }
}

fn attempt_record_filename(code: &str, description: &str, year: AcademicYear) -> String {
    // Descriptions occasionally carry slashes; keep the record inside the
    // output directory.
    let safe_description: String = description
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("{code}_{safe_description}_{}.json", year.start_year())
}
