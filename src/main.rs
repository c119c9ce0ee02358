use std::fs;

use dotenv::dotenv;
use ragno::{BatchRunner, BrowserSession, CatalogueBrowser, CatalogueConfig, DownloadWatcher};
use ragno::{course_list, export, pdf_text::PdfExtractBackend};

extern crate env_logger;
extern crate log;

use log::LevelFilter;

use log::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    let config = CatalogueConfig::from_env()?;
    fs::create_dir_all(&config.output_dir)?;

    let courses = course_list::load_courses(&config.courses_file)?;
    let filter_terms = course_list::load_filter_terms(&config.filter_file)?;
    let courses = course_list::apply_filter(courses, &filter_terms);

    // Failing to bring the browser up at all is the one batch-level fatal
    // condition; nothing can run without it.
    let mut browser = CatalogueBrowser::launch(&config).await?;
    let watcher = DownloadWatcher::new(config.output_dir.clone(), config.download_poll);
    let pdf_backend = PdfExtractBackend;

    let runner = BatchRunner {
        browser: &browser,
        watcher: &watcher,
        pdf_backend: &pdf_backend,
        config: &config,
    };
    let results = runner.run(courses).await;

    browser.close().await?;

    let json_path = config.output_dir.join("all_results.json");
    export::write_json(&json_path, &results)?;
    info!("JSON exported to: {}", json_path.display());

    let csv_path = config.output_dir.join("all_results.csv");
    match export::write_csv(&csv_path, &results) {
        Ok(()) => info!("CSV exported to: {}", csv_path.display()),
        Err(e) => error!("Failed to write CSV: {e:#}"),
    }

    info!("Done! Data and PDFs saved in: {}", config.output_dir.display());
    Ok(())
}
