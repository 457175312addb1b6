//! Document scanning service and its scan-job event stream.
//!
//! Scan progress is pushed to the single [`ScanJobObserver`] passed to the
//! latest `start_scan`/`start_multi_page_scan` call. The fake binds that
//! observer to an [`EventChannel`] and the `simulate_*` helpers deliver
//! through it, then flush pending tasks so the UI under test can react.
//!
//! A started multi-page scan hands back a [`MultiPageScanController`] that
//! the UI uses to scan, rescan or remove pages and to finish the document.
//! [`FakeMultiPageScanController`] records those calls on its own proxy.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fakekit_core::{EventChannel, TestContext, TestProxy};
use fakekit_errors::{FakeError, FakeResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tracked method names.
pub mod methods {
    /// [`super::ScanService::get_scanners`]
    pub const GET_SCANNERS: &str = "get_scanners";
    /// [`super::ScanService::get_scanner_capabilities`]
    pub const GET_SCANNER_CAPABILITIES: &str = "get_scanner_capabilities";
    /// [`super::ScanService::start_scan`]
    pub const START_SCAN: &str = "start_scan";
    /// [`super::ScanService::start_multi_page_scan`]
    pub const START_MULTI_PAGE_SCAN: &str = "start_multi_page_scan";
    /// [`super::ScanService::cancel_scan`]
    pub const CANCEL_SCAN: &str = "cancel_scan";

    /// Every tracked name.
    pub const ALL: [&str; 5] = [
        GET_SCANNERS,
        GET_SCANNER_CAPABILITIES,
        START_SCAN,
        START_MULTI_PAGE_SCAN,
        CANCEL_SCAN,
    ];
}

/// Tracked method names of [`FakeMultiPageScanController`].
pub mod controller_methods {
    /// [`super::MultiPageScanController::scan_next_page`]
    pub const SCAN_NEXT_PAGE: &str = "scan_next_page";
    /// [`super::MultiPageScanController::remove_page`]
    pub const REMOVE_PAGE: &str = "remove_page";
    /// [`super::MultiPageScanController::rescan_page`]
    pub const RESCAN_PAGE: &str = "rescan_page";
    /// [`super::MultiPageScanController::complete_multi_page_scan`]
    pub const COMPLETE_MULTI_PAGE_SCAN: &str = "complete_multi_page_scan";

    /// Every tracked name.
    pub const ALL: [&str; 4] = [
        SCAN_NEXT_PAGE,
        REMOVE_PAGE,
        RESCAN_PAGE,
        COMPLETE_MULTI_PAGE_SCAN,
    ];
}

/// Page bytes delivered by [`FakeScanService::simulate_page_complete`].
pub const FAKE_PAGE_DATA: [u8; 4] = [2, 57, 13, 28];

/// A discovered scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scanner {
    /// Opaque scanner id
    pub id: String,
    /// Name shown in the scanner dropdown
    pub display_name: String,
}

impl Scanner {
    /// Create a scanner.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Colour mode supported by a scan source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    /// 1-bit
    BlackAndWhite,
    /// 8-bit gray
    Grayscale,
    /// RGB
    Color,
}

/// Output file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FileType {
    /// JPEG image per page
    Jpg,
    /// PNG image per page
    Png,
    /// Single PDF document
    #[default]
    Pdf,
}

/// What a scanner can do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerCapabilities {
    /// Source names ("Flatbed", "ADF Duplex", ...)
    pub sources: Vec<String>,
    /// Supported colour modes
    pub color_modes: Vec<ColorMode>,
    /// Supported resolutions in DPI
    pub resolutions: Vec<u32>,
}

/// Settings for one scan job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Source name from [`ScannerCapabilities::sources`]
    pub source_name: String,
    /// Output file type
    pub file_type: FileType,
    /// Colour mode
    pub color_mode: ColorMode,
    /// Resolution in DPI
    pub resolution_dpi: u32,
}

/// Outcome of a scan job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanResult {
    /// Completed
    Success,
    /// Unspecified failure
    UnknownError,
    /// Scanner busy with another job
    DeviceBusy,
    /// Paper jam in the feeder
    AdfJammed,
    /// Feeder is empty
    AdfEmpty,
    /// Flatbed lid open
    FlatbedOpen,
    /// Communication failure
    IoError,
}

/// Receives the events of one running scan job.
pub trait ScanJobObserver: Send + Sync {
    /// Progress of the page being scanned.
    fn on_page_progress(&self, page_number: u32, progress_percent: u32);

    /// A page finished scanning.
    fn on_page_complete(&self, page_data: &[u8], new_page_index: u32);

    /// The whole job finished.
    fn on_scan_complete(&self, result: ScanResult, scanned_file_paths: &[PathBuf]);

    /// A cancel request finished.
    fn on_cancel_complete(&self, success: bool);

    /// A multi-page job failed on its current page.
    fn on_multi_page_scan_fail(&self, result: ScanResult);
}

/// Client interface of the scanning backend.
#[async_trait]
pub trait ScanService: Send + Sync {
    /// Discovered scanners.
    async fn get_scanners(&self) -> FakeResult<Vec<Scanner>>;

    /// Capabilities of one scanner.
    async fn get_scanner_capabilities(&self, scanner_id: &str) -> FakeResult<ScannerCapabilities>;

    /// Start a single-shot scan; events go to `observer`. Returns `false` if
    /// the backend refused to start.
    async fn start_scan(
        &self,
        scanner_id: &str,
        settings: ScanSettings,
        observer: Arc<dyn ScanJobObserver>,
    ) -> FakeResult<bool>;

    /// Start a page-by-page scan; events go to `observer`. Returns the
    /// controller for the running job, or `None` if the backend refused to
    /// start.
    async fn start_multi_page_scan(
        &self,
        scanner_id: &str,
        settings: ScanSettings,
        observer: Arc<dyn ScanJobObserver>,
    ) -> FakeResult<Option<Arc<dyn MultiPageScanController>>>;

    /// Ask the running job to stop.
    async fn cancel_scan(&self) -> FakeResult<()>;
}

/// Page-level control of a running multi-page scan.
#[async_trait]
pub trait MultiPageScanController: Send + Sync {
    /// Scan the next page. Returns `false` if the scanner refused.
    async fn scan_next_page(&self, scanner_id: &str, settings: ScanSettings) -> FakeResult<bool>;

    /// Drop an already scanned page.
    async fn remove_page(&self, page_index: u32) -> FakeResult<()>;

    /// Replace an already scanned page with a fresh scan.
    async fn rescan_page(
        &self,
        scanner_id: &str,
        settings: ScanSettings,
        page_index: u32,
    ) -> FakeResult<bool>;

    /// Save the scanned pages as one document.
    async fn complete_multi_page_scan(&self) -> FakeResult<()>;
}

#[derive(Debug, Default)]
struct PageEdits {
    removed: Option<u32>,
    rescanned: Option<u32>,
}

/// In-memory [`MultiPageScanController`]. Every page request succeeds.
pub struct FakeMultiPageScanController {
    proxy: TestProxy,
    edits: Mutex<PageEdits>,
}

impl FakeMultiPageScanController {
    /// Controller with no recorded calls.
    pub fn new() -> Self {
        Self {
            proxy: TestProxy::new(controller_methods::ALL),
            edits: Mutex::new(PageEdits::default()),
        }
    }

    /// Call tracking for this controller.
    pub fn proxy(&self) -> &TestProxy {
        &self.proxy
    }

    /// Index passed to the latest `remove_page`.
    pub fn page_index_to_remove(&self) -> Option<u32> {
        self.edits.lock().removed
    }

    /// Index passed to the latest `rescan_page`.
    pub fn page_index_to_rescan(&self) -> Option<u32> {
        self.edits.lock().rescanned
    }

    /// Forget page edits and all calls.
    pub fn reset_for_test(&self) {
        *self.edits.lock() = PageEdits::default();
        self.proxy.reset();
    }
}

impl Default for FakeMultiPageScanController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MultiPageScanController for FakeMultiPageScanController {
    async fn scan_next_page(&self, scanner_id: &str, settings: ScanSettings) -> FakeResult<bool> {
        self.proxy.method_called(
            controller_methods::SCAN_NEXT_PAGE,
            (scanner_id.to_string(), settings),
        );
        Ok(true)
    }

    async fn remove_page(&self, page_index: u32) -> FakeResult<()> {
        self.edits.lock().removed = Some(page_index);
        self.proxy
            .method_called(controller_methods::REMOVE_PAGE, page_index);
        Ok(())
    }

    async fn rescan_page(
        &self,
        scanner_id: &str,
        settings: ScanSettings,
        page_index: u32,
    ) -> FakeResult<bool> {
        self.edits.lock().rescanned = Some(page_index);
        self.proxy.method_called(
            controller_methods::RESCAN_PAGE,
            (scanner_id.to_string(), settings, page_index),
        );
        Ok(true)
    }

    async fn complete_multi_page_scan(&self) -> FakeResult<()> {
        self.proxy
            .method_called(controller_methods::COMPLETE_MULTI_PAGE_SCAN, ());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Backend {
    scanners: Vec<Scanner>,
    capabilities: HashMap<String, ScannerCapabilities>,
    fail_start_scan: bool,
}

/// In-memory [`ScanService`].
pub struct FakeScanService {
    ctx: TestContext,
    proxy: TestProxy,
    backend: Mutex<Backend>,
    job: EventChannel<dyn ScanJobObserver>,
    controller: Mutex<Option<Arc<dyn MultiPageScanController>>>,
}

impl FakeScanService {
    /// Fake with no scanners and a default context.
    pub fn new() -> Self {
        Self::with_context(TestContext::default())
    }

    /// Fake bound to `ctx`.
    pub fn with_context(ctx: TestContext) -> Self {
        Self {
            ctx,
            proxy: TestProxy::new(methods::ALL),
            backend: Mutex::new(Backend::default()),
            job: EventChannel::new("scan_job_observer"),
            controller: Mutex::new(None),
        }
    }

    /// Call tracking for this fake.
    pub fn proxy(&self) -> &TestProxy {
        &self.proxy
    }

    /// Forget scanners, capabilities, the bound job observer and all calls.
    ///
    /// The multi-page scan controller stays installed.
    pub fn reset_for_test(&self) {
        *self.backend.lock() = Backend::default();
        self.job.reset();
        self.proxy.reset();
    }

    /// Replace the scanner list.
    pub fn set_scanners(&self, scanners: Vec<Scanner>) {
        self.backend.lock().scanners = scanners;
    }

    /// Append one scanner.
    pub fn add_scanner(&self, scanner: Scanner) {
        self.backend.lock().scanners.push(scanner);
    }

    /// Replace the capabilities table.
    pub fn set_capabilities(&self, capabilities: HashMap<String, ScannerCapabilities>) {
        self.backend.lock().capabilities = capabilities;
    }

    /// Controller handed out by successful multi-page scan starts.
    pub fn set_multi_page_scan_controller(&self, controller: Arc<dyn MultiPageScanController>) {
        *self.controller.lock() = Some(controller);
    }

    /// Make subsequent scan starts report failure.
    pub fn set_fail_start_scan(&self, fail: bool) {
        self.backend.lock().fail_start_scan = fail;
    }

    /// Whether a job observer is currently bound.
    pub fn has_scan_job_observer(&self) -> bool {
        self.job.is_bound()
    }

    /// Number of job events delivered so far.
    pub fn delivered_event_count(&self) -> usize {
        self.job.delivered_count()
    }

    /// Push page progress to the job observer.
    ///
    /// # Errors
    ///
    /// [`FakeError::NoObserverBound`] before any scan was started.
    pub async fn simulate_progress(
        &self,
        page_number: u32,
        progress_percent: u32,
    ) -> FakeResult<()> {
        debug!(page_number, progress_percent, "simulating scan progress");
        self.job
            .deliver(|o| o.on_page_progress(page_number, progress_percent))?;
        self.ctx.flush().await;
        Ok(())
    }

    /// Push 100% progress followed by the completed page.
    ///
    /// # Errors
    ///
    /// [`FakeError::NoObserverBound`] before any scan was started.
    pub async fn simulate_page_complete(
        &self,
        page_number: u32,
        new_page_index: u32,
    ) -> FakeResult<()> {
        debug!(page_number, new_page_index, "simulating page complete");
        self.job.deliver(|o| {
            o.on_page_progress(page_number, 100);
            o.on_page_complete(&FAKE_PAGE_DATA, new_page_index);
        })?;
        self.ctx.flush().await;
        Ok(())
    }

    /// Push job completion.
    ///
    /// # Errors
    ///
    /// [`FakeError::NoObserverBound`] before any scan was started.
    pub async fn simulate_scan_complete(
        &self,
        result: ScanResult,
        scanned_file_paths: Vec<PathBuf>,
    ) -> FakeResult<()> {
        debug!(?result, files = scanned_file_paths.len(), "simulating scan complete");
        self.job
            .deliver(|o| o.on_scan_complete(result, &scanned_file_paths))?;
        self.ctx.flush().await;
        Ok(())
    }

    /// Push the outcome of a cancel request.
    ///
    /// # Errors
    ///
    /// [`FakeError::NoObserverBound`] before any scan was started.
    pub async fn simulate_cancel_complete(&self, success: bool) -> FakeResult<()> {
        debug!(success, "simulating cancel complete");
        self.job.deliver(|o| o.on_cancel_complete(success))?;
        self.ctx.flush().await;
        Ok(())
    }

    /// Push a multi-page scan failure.
    ///
    /// # Errors
    ///
    /// [`FakeError::NoObserverBound`] before any scan was started.
    pub async fn simulate_multi_page_scan_fail(&self, result: ScanResult) -> FakeResult<()> {
        debug!(?result, "simulating multi-page scan failure");
        self.job.deliver(|o| o.on_multi_page_scan_fail(result))?;
        self.ctx.flush().await;
        Ok(())
    }

    fn begin_job(
        &self,
        method: &str,
        scanner_id: &str,
        settings: ScanSettings,
        observer: Arc<dyn ScanJobObserver>,
    ) -> bool {
        self.job.bind(observer);
        self.proxy
            .method_called(method, (scanner_id.to_string(), settings));
        !self.backend.lock().fail_start_scan
    }
}

impl Default for FakeScanService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanService for FakeScanService {
    async fn get_scanners(&self) -> FakeResult<Vec<Scanner>> {
        self.proxy.method_called(methods::GET_SCANNERS, ());
        Ok(self.backend.lock().scanners.clone())
    }

    async fn get_scanner_capabilities(&self, scanner_id: &str) -> FakeResult<ScannerCapabilities> {
        self.proxy
            .method_called(methods::GET_SCANNER_CAPABILITIES, scanner_id.to_string());
        self.backend
            .lock()
            .capabilities
            .get(scanner_id)
            .cloned()
            .ok_or_else(|| {
                FakeError::backend(format!("no capabilities for scanner '{scanner_id}'"))
            })
    }

    async fn start_scan(
        &self,
        scanner_id: &str,
        settings: ScanSettings,
        observer: Arc<dyn ScanJobObserver>,
    ) -> FakeResult<bool> {
        Ok(self.begin_job(methods::START_SCAN, scanner_id, settings, observer))
    }

    async fn start_multi_page_scan(
        &self,
        scanner_id: &str,
        settings: ScanSettings,
        observer: Arc<dyn ScanJobObserver>,
    ) -> FakeResult<Option<Arc<dyn MultiPageScanController>>> {
        if !self.begin_job(methods::START_MULTI_PAGE_SCAN, scanner_id, settings, observer) {
            debug!(scanner_id, "multi-page scan refused");
            return Ok(None);
        }
        Ok(self.controller.lock().clone())
    }

    async fn cancel_scan(&self) -> FakeResult<()> {
        self.proxy.method_called(methods::CANCEL_SCAN, ());
        Ok(())
    }
}
