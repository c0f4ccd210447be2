use crate::capture::{CaptureSettings, run_case};
use crate::case::PageCase;
use crate::driver::Driver;
use crate::error::{CaptureError, Result};
use crate::result::CaptureResult;
use crate::sink::ScreenshotSink;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(CaptureResult) + Send + Sync>;

/// Executes page cases on a pool of async workers.
///
/// Cases share nothing but the queue they are pulled from; each one runs in
/// its own task, so a panic or failure is confined to that case.
pub struct Runner<D: Driver> {
    driver: Arc<D>,
    sink: Arc<dyn ScreenshotSink>,
    settings: Arc<CaptureSettings>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl<D: Driver> Runner<D> {
    pub fn new(driver: Arc<D>, sink: Arc<dyn ScreenshotSink>) -> Self {
        Self {
            driver,
            sink,
            settings: Arc::new(CaptureSettings::default()),
            progress_callback: None,
            result_callback: None,
        }
    }

    pub fn with_settings(mut self, settings: CaptureSettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    /// Run every case and return the results in case order.
    pub async fn run(&self, cases: Vec<PageCase>, workers: usize) -> Result<Vec<CaptureResult>> {
        let total = cases.len();
        if total == 0 {
            info!("No cases to run");
            return Ok(Vec::new());
        }

        let workers = workers.clamp(1, total);
        info!("Running {} case(s) with {} worker(s)", total, workers);
        let started = Instant::now();

        let queue: Arc<Mutex<VecDeque<PageCase>>> = Arc::new(Mutex::new(cases.into()));
        let results: Arc<Mutex<Vec<CaptureResult>>> = Arc::new(Mutex::new(Vec::with_capacity(total)));

        let mut worker_handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let queue = queue.clone();
            let results = results.clone();
            let driver = self.driver.clone();
            let sink = self.sink.clone();
            let settings = self.settings.clone();
            let progress_cb = self.progress_callback.clone();
            let result_cb = self.result_callback.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);

                loop {
                    let next = {
                        let mut queue = queue.lock().await;
                        queue.pop_front()
                    };
                    let Some(case) = next else {
                        break;
                    };

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, case.title.clone());
                    }

                    let case_task = {
                        let driver = driver.clone();
                        let sink = sink.clone();
                        let settings = settings.clone();
                        let case = case.clone();
                        tokio::spawn(async move {
                            run_case(driver.as_ref(), &case, &settings, sink.as_ref()).await
                        })
                    };

                    let result = match case_task.await {
                        Ok(result) => result,
                        Err(e) => {
                            warn!("{} aborted: {}", case.title, e);
                            CaptureResult::with_error(
                                &case,
                                None,
                                format!("case task aborted: {}", e),
                                Default::default(),
                            )
                        }
                    };

                    if let Some(ref callback) = result_cb {
                        callback(result.clone());
                    }
                    results.lock().await.push(result);
                }

                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        for handle in worker_handles {
            handle
                .await
                .map_err(|e| CaptureError::Other(format!("Worker task failed: {}", e)))?;
        }

        let mut results = std::mem::take(&mut *results.lock().await);
        results.sort_by_key(|r| r.index);

        let failed = results.iter().filter(|r| !r.is_passed()).count();
        info!(
            "Run complete in {:?}: {} passed, {} failed",
            started.elapsed(),
            results.len() - failed,
            failed
        );
        Ok(results)
    }
}
