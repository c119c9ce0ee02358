use std::collections::HashSet;

use indicatif::ProgressBar;
use log::info;

use crate::browser::BrowserSession;
use crate::config::CatalogueConfig;
use crate::course_list::CourseQuery;
use crate::course_scraper::{CourseRecord, CourseScraper};
use crate::download_watcher::DownloadWatcher;
use crate::pdf_text::PdfTextBackend;

/// Runs the acquisition engine once per unique course, in input order,
/// against the one shared browser session. A course that fails only fills
/// its own record's `error` field; the batch always runs to completion.
pub struct BatchRunner<'a> {
    pub browser: &'a dyn BrowserSession,
    pub watcher: &'a DownloadWatcher,
    pub pdf_backend: &'a dyn PdfTextBackend,
    pub config: &'a CatalogueConfig,
}

impl BatchRunner<'_> {
    pub async fn run(&self, courses: Vec<CourseQuery>) -> Vec<CourseRecord> {
        let progress = ProgressBar::new(courses.len() as u64);
        let mut seen_descriptions: HashSet<String> = HashSet::new();
        let mut results = Vec::new();

        for course in courses {
            if !seen_descriptions.insert(course.description.clone()) {
                info!("Skipping duplicate course: {}", course.description);
                progress.inc(1);
                continue;
            }
            let scraper = CourseScraper {
                query: course,
                browser: self.browser,
                watcher: self.watcher,
                pdf_backend: self.pdf_backend,
                config: self.config,
            };
            results.push(scraper.scrape().await);
            progress.inc(1);
        }

        progress.finish_and_clear();
        results
    }
}
