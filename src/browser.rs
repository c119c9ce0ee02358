use async_trait::async_trait;

use crate::config::AcademicYear;

/// The page interactions the acquisition pipeline needs from the catalogue
/// site. Implementations own the selectors and navigation details; the
/// engine only sees these operations, so tests can substitute a scripted
/// session.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to the catalogue's search entry point.
    async fn open_search_page(&self) -> anyhow::Result<()>;

    /// Switch the catalogue interface to its English variant.
    async fn select_english_interface(&self) -> anyhow::Result<()>;

    /// Fill the search field with `description`, pick `year` in the year
    /// filter and submit the search.
    async fn submit_search(&self, description: &str, year: AcademicYear) -> anyhow::Result<()>;

    /// Wait (bounded) for a results link matching the catalogue `code`.
    /// `None` means no such link appeared, which the caller treats as
    /// "course not offered this year".
    async fn find_course_link(&self, code: &str) -> anyhow::Result<Option<String>>;

    async fn open_course_page(&self, url: &str) -> anyhow::Result<()>;

    /// Click the course page's save-document action. The resulting file
    /// lands in the session's download directory.
    async fn trigger_document_save(&self) -> anyhow::Result<()>;

    async fn close(&mut self) -> anyhow::Result<()>;
}
