//! Render driver: rasterise the compiled document to a fixed-geometry PDF.
//!
//! ## Two strategies, one contract
//!
//! Headless-browser automation is not safe to drive from arbitrary execution
//! contexts — a host that already owns an event loop, a thread pool with its
//! own IO model, or a platform whose process transport fights the caller's
//! reactor. Instead of scattering platform conditionals, the driver exposes
//! one `render_pdf` capability backed by two interchangeable strategies:
//!
//! * [`RenderStrategy::InProcess`] — chromiumoxide on the caller's runtime.
//!   Full control: exact viewport, network-idle wait, settle delay, geometry
//!   re-assertion script, printToPDF with CSS-authored page size.
//! * [`RenderStrategy::Subprocess`] — re-execute the current binary with a
//!   hidden worker flag so the same rendering runs in a freshly isolated
//!   process with its own runtime. Artifact paths travel as arguments, the
//!   render settings as a JSON-encoded environment variable; the worker is
//!   killed hard at the wait ceiling.
//!
//! A policy function picks the attempt order per platform; every attempt is
//! bounded and every exit path tears down the browser process and its
//! temporary profile directory.

use crate::config::{CarouselConfig, PageSize};
use crate::error::CarouselError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Hidden CLI flag that switches the binary into worker mode. Part of the
/// subprocess strategy's exchange contract, so it lives here rather than in
/// the binary.
pub const WORKER_FLAG: &str = "--render-worker";

/// Environment variable carrying the parent's render settings into the
/// worker process, as a JSON-encoded [`WorkerConfig`].
pub const WORKER_ENV: &str = "MD2CAROUSEL_WORKER_CONFIG";

/// CSS pixels per inch, as printToPDF counts them.
const CSS_PX_PER_INCH: f64 = 96.0;

/// Which execution strategy rendered (or should render) the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderStrategy {
    /// chromiumoxide driven on the caller's tokio runtime.
    InProcess,
    /// An isolated re-execution of the current binary in worker mode.
    Subprocess,
}

impl RenderStrategy {
    /// Stable name used in stats and logs.
    pub fn name(self) -> &'static str {
        match self {
            RenderStrategy::InProcess => "in-process",
            RenderStrategy::Subprocess => "subprocess",
        }
    }
}

/// Outcome of a successful render.
#[derive(Debug)]
pub struct RenderReport {
    /// Strategy that produced the PDF.
    pub strategy: RenderStrategy,
    /// Raw PDF bytes, identical to the file written at the output path.
    pub pdf_bytes: Vec<u8>,
    /// Strategies tried, including the successful one.
    pub attempts: usize,
}

/// Attempt order for this host.
///
/// A pinned `config.strategy` collapses the chain to that one entry. The
/// platform branch exists because Chromium's pipe transport on Windows has a
/// history of stalling under an already-busy proactor reactor; the isolated
/// worker is the safer first try there, while unix hosts get the cheaper
/// in-process path first.
pub fn strategy_order(config: &CarouselConfig) -> Vec<RenderStrategy> {
    if let Some(pinned) = config.strategy {
        return vec![pinned];
    }
    if cfg!(windows) {
        vec![RenderStrategy::Subprocess, RenderStrategy::InProcess]
    } else {
        vec![RenderStrategy::InProcess, RenderStrategy::Subprocess]
    }
}

/// Rasterise the document at `html_path` into `pdf_path`.
///
/// Walks the strategy chain; the first success wins. Total failure of the
/// chain returns [`CarouselError::RenderFailed`] carrying the last failure
/// detail — never a panic, and never dangling temporary state.
pub async fn render_pdf(
    html_path: &Path,
    pdf_path: &Path,
    config: &CarouselConfig,
) -> Result<RenderReport, CarouselError> {
    let order = strategy_order(config);
    let mut last_detail = String::new();

    for (attempt, strategy) in order.iter().enumerate() {
        let start = Instant::now();
        info!(
            "Render attempt {}/{} via {}",
            attempt + 1,
            order.len(),
            strategy.name()
        );

        let result = match strategy {
            RenderStrategy::InProcess => render_in_process(html_path, pdf_path, config).await,
            RenderStrategy::Subprocess => render_subprocess(html_path, pdf_path, config).await,
        };

        match result {
            Ok(pdf_bytes) => {
                info!(
                    "Rendered {} bytes via {} in {}ms",
                    pdf_bytes.len(),
                    strategy.name(),
                    start.elapsed().as_millis()
                );
                return Ok(RenderReport {
                    strategy: *strategy,
                    pdf_bytes,
                    attempts: attempt + 1,
                });
            }
            Err(e) => {
                warn!("{} strategy failed: {e}", strategy.name());
                last_detail = e.to_string();
            }
        }
    }

    Err(CarouselError::RenderFailed {
        attempts: order.len(),
        detail: last_detail,
        html_path: html_path.to_path_buf(),
    })
}

// ── In-process strategy ──────────────────────────────────────────────────

async fn render_in_process(
    html_path: &Path,
    pdf_path: &Path,
    config: &CarouselConfig,
) -> Result<Vec<u8>, CarouselError> {
    let ceiling = Duration::from_secs(config.render_timeout_secs);
    let bytes = tokio::time::timeout(ceiling, drive_browser(html_path, config))
        .await
        .map_err(|_| CarouselError::RenderTimeout {
            secs: config.render_timeout_secs,
        })??;

    tokio::fs::write(pdf_path, &bytes)
        .await
        .map_err(|e| CarouselError::ArtifactWriteFailed {
            path: pdf_path.to_path_buf(),
            source: e,
        })?;

    Ok(bytes)
}

/// Launch, navigate, settle, re-assert geometry, print. The browser process
/// and its profile directory are torn down on every exit path.
async fn drive_browser(html_path: &Path, config: &CarouselConfig) -> Result<Vec<u8>, CarouselError> {
    let url = file_url(html_path)?;

    // Exclusive, throwaway profile: no two renders ever share browser state,
    // and dropping the TempDir removes it even on the error paths.
    let profile_dir = TempDir::new()
        .map_err(|e| CarouselError::Internal(format!("temp profile dir: {e}")))?;

    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .user_data_dir(profile_dir.path())
        .window_size(config.page_size.width, config.page_size.height)
        .viewport(Viewport {
            width: config.page_size.width,
            height: config.page_size.height,
            device_scale_factor: Some(config.device_scale_factor),
            ..Default::default()
        })
        .arg("--disable-dev-shm-usage");

    if let Some(ref exe) = config.chrome_executable {
        builder = builder.chrome_executable(exe.clone());
    }

    let browser_config = builder
        .build()
        .map_err(|e| CarouselError::Internal(format!("browser config: {e}")))?;

    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| CarouselError::Internal(format!("browser launch: {e}")))?;

    // The handler future must be polled for the whole session; it carries the
    // CDP websocket traffic.
    let driver = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let result = capture_pdf(&browser, &url, config).await;

    // Teardown regardless of outcome.
    if let Err(e) = browser.close().await {
        debug!("browser close: {e}");
    }
    if let Err(e) = browser.wait().await {
        debug!("browser wait: {e}");
    }
    driver.abort();
    drop(profile_dir);

    result
}

async fn capture_pdf(
    browser: &Browser,
    url: &str,
    config: &CarouselConfig,
) -> Result<Vec<u8>, CarouselError> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| CarouselError::Internal(format!("open page: {e}")))?;

    // Navigation and network idle, bounded so a broken document cannot hang
    // the pipeline.
    let nav = Duration::from_secs(config.navigation_timeout_secs);
    tokio::time::timeout(nav, page.wait_for_navigation())
        .await
        .map_err(|_| CarouselError::Internal(format!("navigation timed out after {nav:?}")))?
        .map_err(|e| CarouselError::Internal(format!("navigation: {e}")))?;

    // Fonts and brand images keep painting after the load signal.
    tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;

    force_page_geometry(&page, config).await?;

    let inches_w = f64::from(config.page_size.width) / CSS_PX_PER_INCH;
    let inches_h = f64::from(config.page_size.height) / CSS_PX_PER_INCH;

    let params = PrintToPdfParams {
        landscape: Some(false),
        display_header_footer: Some(false),
        print_background: Some(true),
        scale: Some(1.0),
        paper_width: Some(inches_w),
        paper_height: Some(inches_h),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        prefer_css_page_size: Some(true),
        ..Default::default()
    };

    let bytes = page
        .pdf(params)
        .await
        .map_err(|e| CarouselError::Internal(format!("printToPDF: {e}")))?;

    if !bytes.starts_with(b"%PDF") {
        return Err(CarouselError::Internal(format!(
            "printToPDF returned {} bytes that are not a PDF",
            bytes.len()
        )));
    }

    debug!("Captured {} PDF bytes", bytes.len());
    Ok(bytes)
}

/// Re-assert every page block's computed box model and inject the print
/// stylesheet. The author styles already say all of this; the layout engine
/// is not guaranteed to have applied them before paint, and printToPDF
/// captures whatever is current.
async fn force_page_geometry(page: &Page, config: &CarouselConfig) -> Result<(), CarouselError> {
    let js = geometry_script(config.page_size.width, config.page_size.height);
    page.evaluate(js)
        .await
        .map_err(|e| CarouselError::Internal(format!("geometry script: {e}")))?;
    Ok(())
}

fn geometry_script(width: u32, height: u32) -> String {
    format!(
        r#"(() => {{
  document.documentElement.style.margin = '0';
  document.documentElement.style.padding = '0';
  document.body.style.width = '{width}px';
  document.body.style.height = 'auto';
  document.body.style.overflow = 'hidden';
  document.body.style.margin = '0';
  document.body.style.padding = '0';

  for (const slide of document.querySelectorAll('.slide')) {{
    slide.style.width = '{width}px';
    slide.style.height = '{height}px';
    slide.style.minHeight = '{height}px';
    slide.style.maxHeight = '{height}px';
    slide.style.boxSizing = 'border-box';
    slide.style.margin = '0';
    slide.style.position = 'relative';
    slide.style.pageBreakAfter = 'always';
    slide.style.pageBreakInside = 'avoid';
    slide.style.webkitPrintColorAdjust = 'exact';
    slide.style.printColorAdjust = 'exact';
  }}

  const style = document.createElement('style');
  style.textContent = `
    @media print {{
      * {{
        -webkit-print-color-adjust: exact !important;
        color-adjust: exact !important;
        print-color-adjust: exact !important;
      }}
      .slide {{
        page-break-after: always !important;
        page-break-inside: avoid !important;
      }}
    }}`;
  document.head.appendChild(style);
}})()"#
    )
}

/// Build a `file://` URL from a filesystem path, canonicalised so relative
/// asset references resolve against the document's real directory.
fn file_url(path: &Path) -> Result<String, CarouselError> {
    let abs = std::fs::canonicalize(path).map_err(|e| CarouselError::Internal(format!(
        "cannot resolve '{}': {e}",
        path.display()
    )))?;
    Ok(url_from_absolute(&abs.to_string_lossy()))
}

/// Turn an absolute path string into a navigable `file://` URL.
///
/// Windows canonicalisation returns verbatim paths (`\\?\C:\...`,
/// `\\?\UNC\server\share\...`), which Chrome refuses to navigate as URLs;
/// the prefix has to come off before the scheme goes on.
fn url_from_absolute(abs: &str) -> String {
    let s = abs.replace('\\', "/");
    if let Some(rest) = s.strip_prefix("//?/UNC/") {
        format!("file://{rest}")
    } else if let Some(rest) = s.strip_prefix("//?/") {
        format!("file:///{rest}")
    } else if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}

// ── Subprocess strategy ──────────────────────────────────────────────────

/// Render settings forwarded across the worker exchange.
///
/// The worker must rasterise with the caller's geometry and browser
/// selection, not the defaults of a fresh process — a pinned Chrome path or
/// a non-square page would otherwise silently revert on the fallback
/// strategy. This is the subset of [`CarouselConfig`] the worker needs,
/// serialised into [`WORKER_ENV`] on the spawned command; the two artifact
/// paths still travel as arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub page_size: PageSize,
    pub device_scale_factor: f64,
    pub settle_delay_ms: u64,
    pub navigation_timeout_secs: u64,
    pub render_timeout_secs: u64,
    pub chrome_executable: Option<PathBuf>,
}

impl From<&CarouselConfig> for WorkerConfig {
    fn from(config: &CarouselConfig) -> Self {
        Self {
            page_size: config.page_size,
            device_scale_factor: config.device_scale_factor,
            settle_delay_ms: config.settle_delay_ms,
            navigation_timeout_secs: config.navigation_timeout_secs,
            render_timeout_secs: config.render_timeout_secs,
            chrome_executable: config.chrome_executable.clone(),
        }
    }
}

impl WorkerConfig {
    /// Rehydrate a pipeline config for the worker's own render pass.
    /// Generation fields stay at their defaults; the worker never calls the
    /// generator.
    fn into_config(self) -> CarouselConfig {
        CarouselConfig {
            page_size: self.page_size,
            device_scale_factor: self.device_scale_factor,
            settle_delay_ms: self.settle_delay_ms,
            navigation_timeout_secs: self.navigation_timeout_secs,
            render_timeout_secs: self.render_timeout_secs,
            chrome_executable: self.chrome_executable,
            ..CarouselConfig::default()
        }
    }
}

/// Spawn an isolated worker process running the same rendering capability.
///
/// The worker is this very binary re-executed with [`WORKER_FLAG`]; it writes
/// the PDF to `pdf_path` and exits. Success is judged by exit status plus a
/// valid PDF at the exchange path. `kill_on_drop` guarantees the child dies
/// when the wait ceiling drops the future.
async fn render_subprocess(
    html_path: &Path,
    pdf_path: &Path,
    config: &CarouselConfig,
) -> Result<Vec<u8>, CarouselError> {
    let exe = std::env::current_exe()
        .map_err(|e| CarouselError::Internal(format!("current_exe: {e}")))?;

    let forwarded = serde_json::to_string(&WorkerConfig::from(config))
        .map_err(|e| CarouselError::Internal(format!("worker config: {e}")))?;

    debug!("Spawning render worker: {}", exe.display());
    let child = tokio::process::Command::new(&exe)
        .arg(WORKER_FLAG)
        .arg(html_path)
        .arg(pdf_path)
        .env(WORKER_ENV, forwarded)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CarouselError::Internal(format!("spawn worker: {e}")))?;

    let ceiling = Duration::from_secs(config.render_timeout_secs);
    let output = tokio::time::timeout(ceiling, child.wait_with_output())
        .await
        .map_err(|_| CarouselError::RenderTimeout {
            secs: config.render_timeout_secs,
        })?
        .map_err(|e| CarouselError::Internal(format!("worker wait: {e}")))?;

    if !output.status.success() {
        return Err(CarouselError::Internal(format!(
            "worker exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let bytes = tokio::fs::read(pdf_path)
        .await
        .map_err(|e| CarouselError::Internal(format!("worker produced no PDF: {e}")))?;

    if !bytes.starts_with(b"%PDF") {
        return Err(CarouselError::Internal(
            "worker output is not a valid PDF".into(),
        ));
    }

    Ok(bytes)
}

/// Worker-side entry point, called by the binary when [`WORKER_FLAG`] is the
/// first argument. Rehydrates the parent's render settings from
/// [`WORKER_ENV`] and runs the in-process strategy; a missing variable
/// (manual invocation) falls back to the defaults.
pub async fn run_worker(html_path: &Path, pdf_path: &Path) -> Result<(), CarouselError> {
    let config = match std::env::var(WORKER_ENV) {
        Ok(json) => serde_json::from_str::<WorkerConfig>(&json)
            .map_err(|e| CarouselError::Internal(format!("worker config: {e}")))?
            .into_config(),
        Err(_) => CarouselConfig::default(),
    };
    render_in_process(html_path, pdf_path, &config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSize;

    #[test]
    fn pinned_strategy_collapses_chain() {
        let config = CarouselConfig::builder()
            .strategy(RenderStrategy::Subprocess)
            .build()
            .unwrap();
        assert_eq!(strategy_order(&config), vec![RenderStrategy::Subprocess]);
    }

    #[test]
    fn default_chain_has_both_strategies() {
        let order = strategy_order(&CarouselConfig::default());
        assert_eq!(order.len(), 2);
        assert!(order.contains(&RenderStrategy::InProcess));
        assert!(order.contains(&RenderStrategy::Subprocess));
    }

    #[test]
    fn carousel_page_is_11_25_inches() {
        let size = PageSize::SQUARE_1080;
        let inches = f64::from(size.width) / CSS_PX_PER_INCH;
        assert!((inches - 11.25).abs() < f64::EPSILON);
    }

    #[test]
    fn geometry_script_embeds_target_size() {
        let js = geometry_script(1080, 1080);
        assert!(js.contains("'1080px'"));
        assert!(js.contains("pageBreakAfter"));
        assert!(js.contains("print-color-adjust: exact"));
    }

    #[test]
    fn file_url_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("doc.html");
        std::fs::write(&p, "<html></html>").unwrap();
        let url = file_url(&p).unwrap();
        assert!(url.starts_with("file:///"), "got: {url}");
        assert!(url.ends_with("doc.html"));
    }

    #[test]
    fn missing_file_url_errors() {
        assert!(file_url(Path::new("/no/such/file.html")).is_err());
    }

    #[test]
    fn verbatim_windows_paths_lose_their_prefix() {
        assert_eq!(
            url_from_absolute(r"\\?\C:\Users\doc.html"),
            "file:///C:/Users/doc.html"
        );
        assert_eq!(
            url_from_absolute(r"\\?\UNC\srv\share\doc.html"),
            "file://srv/share/doc.html"
        );
    }

    #[test]
    fn plain_drive_paths_get_three_slashes() {
        assert_eq!(
            url_from_absolute(r"C:\docs\doc.html"),
            "file:///C:/docs/doc.html"
        );
    }

    #[test]
    fn worker_exchange_preserves_render_settings() {
        let config = CarouselConfig::builder()
            .chrome_executable("/opt/chromium/chrome")
            .page_size(PageSize {
                width: 800,
                height: 800,
            })
            .device_scale_factor(3.0)
            .settle_delay_ms(1234)
            .navigation_timeout_secs(7)
            .render_timeout_secs(45)
            .build()
            .unwrap();

        // Same round trip the subprocess strategy performs via WORKER_ENV.
        let json = serde_json::to_string(&WorkerConfig::from(&config)).unwrap();
        let rehydrated = serde_json::from_str::<WorkerConfig>(&json)
            .unwrap()
            .into_config();

        assert_eq!(
            rehydrated.chrome_executable.as_deref(),
            Some(Path::new("/opt/chromium/chrome"))
        );
        assert_eq!(rehydrated.page_size, config.page_size);
        assert_eq!(rehydrated.device_scale_factor, 3.0);
        assert_eq!(rehydrated.settle_delay_ms, 1234);
        assert_eq!(rehydrated.navigation_timeout_secs, 7);
        assert_eq!(rehydrated.render_timeout_secs, 45);
        // Generation settings never cross the exchange.
        assert!(rehydrated.api_key.is_none());
        assert!(rehydrated.generator.is_none());
    }

    #[tokio::test]
    async fn both_strategies_failing_reports_not_panics() {
        // A nonexistent chrome executable fails the in-process launch; the
        // subprocess path fails because the test binary rejects the worker
        // flag. Either way the chain must end in RenderFailed with the HTML
        // path preserved.
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("doc.html");
        std::fs::write(&html, "<html><body></body></html>").unwrap();
        let pdf = dir.path().join("doc.pdf");

        let config = CarouselConfig::builder()
            .chrome_executable("/no/such/chrome-binary")
            .render_timeout_secs(10)
            .build()
            .unwrap();

        let err = render_pdf(&html, &pdf, &config).await.unwrap_err();
        match err {
            CarouselError::RenderFailed {
                attempts,
                html_path,
                ..
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(html_path, html);
            }
            other => panic!("expected RenderFailed, got {other:?}"),
        }
        assert!(!pdf.exists(), "failed render must not leave a PDF behind");
    }
}
