use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, de::DeserializeOwned};

const DEFAULT_BASE_URL: &str = "https://unitn.coursecatalogue.cineca.it/cerca-insegnamenti";
const DEFAULT_OUTPUT_DIR: &str = "unitn_data";
const DEFAULT_COURSES_FILE: &str = "data.json";
const DEFAULT_FILTER_FILE: &str = "specific.txt";
const DEFAULT_YEARS_TO_TRY: u32 = 5;
const DEFAULT_PAGE_LOAD_SECS: u64 = 40;
const DEFAULT_ELEMENT_WAIT_SECS: u64 = 20;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOWNLOAD_POLL_MS: u64 = 500;

/// The env vars understood by the scraper. Every one is optional; the
/// defaults target the UniTN course catalogue.
#[derive(Debug, Deserialize)]
struct CatalogueEnv {
    catalogue_base_url: Option<String>,
    output_dir: Option<PathBuf>,
    courses_file: Option<PathBuf>,
    filter_file: Option<PathBuf>,
    newest_year: Option<String>,
    years_to_try: Option<u32>,
    page_load_secs: Option<u64>,
    element_wait_secs: Option<u64>,
    download_timeout_secs: Option<u64>,
    download_poll_ms: Option<u64>,
    headless: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CatalogueConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub courses_file: PathBuf,
    pub filter_file: PathBuf,
    pub newest_year: AcademicYear,
    pub years_to_try: u32,
    pub page_load_timeout: Duration,
    pub element_wait: Duration,
    pub download_timeout: Duration,
    pub download_poll: Duration,
    pub headless: bool,
}

impl CatalogueConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let env = CatalogueEnv::load_from_env()?;
        let newest_year = match env.newest_year {
            Some(raw) => YearLabelParser::new()?.parse(&raw)?,
            // The catalogue's newest offering tracks the calendar year.
            None => AcademicYear::new(Utc::now().year()),
        };
        Ok(Self {
            base_url: env
                .catalogue_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            output_dir: env
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            courses_file: env
                .courses_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COURSES_FILE)),
            filter_file: env
                .filter_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FILTER_FILE)),
            newest_year,
            years_to_try: env.years_to_try.unwrap_or(DEFAULT_YEARS_TO_TRY),
            page_load_timeout: Duration::from_secs(
                env.page_load_secs.unwrap_or(DEFAULT_PAGE_LOAD_SECS),
            ),
            element_wait: Duration::from_secs(
                env.element_wait_secs.unwrap_or(DEFAULT_ELEMENT_WAIT_SECS),
            ),
            download_timeout: Duration::from_secs(
                env.download_timeout_secs
                    .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            ),
            download_poll: Duration::from_millis(
                env.download_poll_ms.unwrap_or(DEFAULT_DOWNLOAD_POLL_MS),
            ),
            headless: env.headless.unwrap_or(false),
        })
    }

    /// The academic years to attempt for each course, newest first.
    pub fn candidate_years(&self) -> Vec<AcademicYear> {
        (0..self.years_to_try)
            .map(|back| AcademicYear::new(self.newest_year.start_year() - back as i32))
            .collect()
    }
}

/// One year of the course catalogue, labelled like `2024/2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcademicYear {
    start: i32,
}

impl AcademicYear {
    pub fn new(start: i32) -> Self {
        Self { start }
    }

    pub fn start_year(&self) -> i32 {
        self.start
    }

    /// The label the catalogue's year filter displays.
    pub fn label(&self) -> String {
        format!("{}/{}", self.start, self.start + 1)
    }
}

impl std::fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub struct YearLabelParser {
    // Accepts either a bare start year or a full catalogue label.
    label_regex: Regex,
}

impl YearLabelParser {
    pub fn new() -> anyhow::Result<Self> {
        let label_regex = Regex::new(r"^(\d{4})(?:/(\d{4}))?$")?;
        Ok(Self { label_regex })
    }

    pub fn parse(&self, raw: &str) -> anyhow::Result<AcademicYear> {
        let Some(caps) = self.label_regex.captures(raw.trim()) else {
            return Err(anyhow::anyhow!(
                "couldn't parse academic year from: {}",
                raw
            ));
        };
        let start = caps[1].parse::<i32>()?;
        if let Some(end) = caps.get(2) {
            let end = end.as_str().parse::<i32>()?;
            if end != start + 1 {
                return Err(anyhow::anyhow!(
                    "academic year label must span consecutive years: {}",
                    raw
                ));
            }
        }
        Ok(AcademicYear::new(start))
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
