use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use scraper::Selector;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};

use crate::browser::BrowserSession;
use crate::config::{AcademicYear, CatalogueConfig};
use crate::text_manipulators::{extract_text, resolve_href};

const ELEMENT_POLL: Duration = Duration::from_millis(250);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("RAGNO_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(path) = which::which("google-chrome") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium-browser") {
        return Some(path);
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// `BrowserSession` backed by a Chromium instance driven over CDP. Owns the
/// one page reused for every course and every year attempt.
pub struct CatalogueBrowser {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    base_url: String,
    element_wait: Duration,
    page_load_timeout: Duration,
}

impl CatalogueBrowser {
    pub async fn launch(config: &CatalogueConfig) -> anyhow::Result<Self> {
        let chrome_path =
            find_chromium().context("Chromium not found. Set RAGNO_CHROMIUM_PATH.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage");
        if config.headless {
            builder = builder.arg("--headless=new").arg("--disable-gpu");
        } else {
            // chromiumoxide launches headless unless told otherwise.
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the handler task
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to create page")?;

        // Save documents into the output directory instead of the profile's
        // default download location.
        let download_behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(config.output_dir.display().to_string())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build download behavior: {e}"))?;
        page.execute(download_behavior)
            .await
            .context("failed to set download behavior")?;

        Ok(Self {
            browser,
            page,
            handler_task,
            base_url: config.base_url.clone(),
            element_wait: config.element_wait,
            page_load_timeout: config.page_load_timeout,
        })
    }

    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        let result = timeout(self.page_load_timeout, self.page.goto(url)).await;
        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => bail!("navigation to {url} failed: {e}"),
            Err(_) => bail!(
                "navigation to {url} timed out after {:?}",
                self.page_load_timeout
            ),
        }
    }

    async fn get_html(&self) -> anyhow::Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;
        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))?;
        Ok(html)
    }

    async fn eval_bool(&self, script: &str) -> anyhow::Result<bool> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;
        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    /// Click the first `tag` element whose text contains `text`, polling
    /// until it exists or the element wait expires.
    async fn click_by_text(&self, tag: &str, text: &str) -> anyhow::Result<()> {
        let needle = serde_json::to_string(text)?;
        let script = format!(
            "(() => {{
                const el = Array.from(document.querySelectorAll('{tag}'))
                    .find(e => (e.textContent || '').includes({needle}));
                if (!el) return false;
                el.click();
                return true;
            }})()"
        );
        let deadline = Instant::now() + self.element_wait;
        loop {
            if self.eval_bool(&script).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("timed out waiting for <{tag}> containing {text:?}");
            }
            sleep(ELEMENT_POLL).await;
        }
    }

    async fn select_year_option(&self, label: &str) -> anyhow::Result<()> {
        let needle = serde_json::to_string(label)?;
        let script = format!(
            "(() => {{
                const select = document.querySelector(\"select[name='anno_off']\");
                if (!select) return false;
                const option = Array.from(select.options)
                    .find(o => o.textContent.trim() === {needle});
                if (!option) return false;
                select.value = option.value;
                select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"
        );
        let deadline = Instant::now() + self.element_wait;
        loop {
            if self.eval_bool(&script).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("year {label} not present in the year filter");
            }
            sleep(ELEMENT_POLL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for CatalogueBrowser {
    async fn open_search_page(&self) -> anyhow::Result<()> {
        self.goto(&self.base_url).await
    }

    async fn select_english_interface(&self) -> anyhow::Result<()> {
        self.click_by_text("a", "EN").await
    }

    async fn submit_search(&self, description: &str, year: AcademicYear) -> anyhow::Result<()> {
        let deadline = Instant::now() + self.element_wait;
        let search_box = loop {
            if let Ok(el) = self.page.find_element("input[name='insegnamento']").await {
                break el;
            }
            if Instant::now() >= deadline {
                bail!("timed out waiting for the search field");
            }
            sleep(ELEMENT_POLL).await;
        };
        self.page
            .evaluate("document.querySelector(\"input[name='insegnamento']\").value = ''")
            .await
            .context("failed to clear the search field")?;
        search_box.click().await?;
        search_box.type_str(description).await?;

        self.select_year_option(&year.label()).await?;
        self.click_by_text("button", "Submit").await
    }

    async fn find_course_link(&self, code: &str) -> anyhow::Result<Option<String>> {
        let deadline = Instant::now() + self.element_wait;
        loop {
            let html = self.get_html().await?;
            if let Some(href) = find_course_link_in_html(&html, &self.base_url, code) {
                return Ok(Some(href));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(ELEMENT_POLL).await;
        }
    }

    async fn open_course_page(&self, url: &str) -> anyhow::Result<()> {
        self.goto(url).await
    }

    async fn trigger_document_save(&self) -> anyhow::Result<()> {
        self.click_by_text("button", "Save PDF").await
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.browser.close().await.context("failed to close browser")?;
        self.handler_task.abort();
        Ok(())
    }
}

/// Locate the results anchor for `code` in the rendered search results.
fn find_course_link_in_html(html: &str, base_url: &str, code: &str) -> Option<String> {
    let document = scraper::Html::parse_document(html);
    let link_selector = Selector::parse("a[href*='insegnamenti']").unwrap();
    for node in document.select(&link_selector) {
        let href = node.value().attr("href").unwrap_or("");
        if href.is_empty() {
            continue;
        }
        let text = extract_text(node);
        if text.contains(code) || href.contains(code) {
            return Some(resolve_href(base_url, href));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://unitn.coursecatalogue.cineca.it/cerca-insegnamenti";

    #[test]
    fn finds_link_by_code_in_text() {
        let html = r#"
            <html><body>
                <a href="/insegnamenti/2025/99999">OTHER COURSE</a>
                <a href="/insegnamenti/2025/12345">145101 - ALGORITHMS</a>
                <a href="/help">145101</a>
            </body></html>
        "#;
        let link = find_course_link_in_html(html, BASE, "145101");
        assert_eq!(
            link.as_deref(),
            Some("https://unitn.coursecatalogue.cineca.it/insegnamenti/2025/12345")
        );
    }

    #[test]
    fn finds_link_by_code_in_href() {
        let html = r#"<a href="https://x.test/insegnamenti/145101">Course page</a>"#;
        let link = find_course_link_in_html(html, BASE, "145101");
        assert_eq!(link.as_deref(), Some("https://x.test/insegnamenti/145101"));
    }

    #[test]
    fn no_matching_anchor_yields_none() {
        let html = r#"<a href="/insegnamenti/2025/1">SOMETHING ELSE</a>"#;
        assert_eq!(find_course_link_in_html(html, BASE, "145101"), None);
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn live_browser_clicks_buttons_by_text() {
        let mut config = crate::config::tests::test_config();
        config.base_url =
            "data:text/html,<button onclick=\"this.textContent='done'\">Submit</button>"
                .to_string();
        let dir = tempfile::tempdir().unwrap();
        config.output_dir = dir.path().to_path_buf();

        let mut browser = CatalogueBrowser::launch(&config).await.expect("launch");
        browser.open_search_page().await.expect("open");
        browser.click_by_text("button", "Submit").await.expect("click");
        let html = browser.get_html().await.expect("html");
        assert!(html.contains("done"));
        browser.close().await.expect("close");
    }
}
