pub mod batch_runner;
pub mod browser;
pub mod catalogue_browser;
pub mod config;
pub mod course_list;
pub mod course_scraper;
pub mod download_watcher;
pub mod export;
pub mod pdf_text;
pub mod text_manipulators;

pub use batch_runner::BatchRunner;
pub use browser::BrowserSession;
pub use catalogue_browser::CatalogueBrowser;
pub use config::{AcademicYear, CatalogueConfig};
pub use course_list::CourseQuery;
pub use course_scraper::{CourseRecord, CourseScraper};
pub use download_watcher::DownloadWatcher;
pub use pdf_text::{PdfExtractBackend, PdfTextBackend};
