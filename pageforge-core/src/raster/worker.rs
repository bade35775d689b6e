//! Off-thread rendering with a timeout and a synchronous fallback.
//!
//! A [`RenderClient`] keeps one worker thread that owns its rasterizer and
//! answers render jobs over a channel. The worker holds no state between
//! jobs and is reused across calls. When a job times out or the worker
//! thread dies, the client tears the worker down and runs the identical
//! [`render_pages`] routine on the calling thread; the fallback path
//! produces byte-identical output because it is the same algorithm in a
//! different execution context. Typed render failures coming back over the
//! channel are surfaced directly; they would fail identically on a retry.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use super::{render_pages, PageRasterizer, RenderOptions, RenderedPage};
use crate::operations::{OperationError, OperationResult};

/// Deadline for one render job in the worker.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

struct RenderJob {
    data: Vec<u8>,
    options: RenderOptions,
    reply: mpsc::Sender<OperationResult<Vec<RenderedPage>>>,
}

struct WorkerHandle {
    sender: mpsc::Sender<RenderJob>,
}

impl WorkerHandle {
    fn spawn(mut rasterizer: Box<dyn PageRasterizer>) -> Self {
        let (sender, receiver) = mpsc::channel::<RenderJob>();
        thread::spawn(move || {
            while let Ok(job) = receiver.recv() {
                let result = render_pages(&job.data, &job.options, rasterizer.as_mut());
                let _ = job.reply.send(result);
            }
        });
        Self { sender }
    }
}

/// Client side of the render worker.
pub struct RenderClient<F>
where
    F: Fn() -> Box<dyn PageRasterizer>,
{
    factory: F,
    worker: Option<WorkerHandle>,
    timeout: Duration,
}

impl<F> RenderClient<F>
where
    F: Fn() -> Box<dyn PageRasterizer>,
{
    /// Create a client that builds rasterizer instances with `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            worker: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-job deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Render all pages, preferring the worker thread.
    ///
    /// A timeout or dead worker triggers exactly one synchronous fallback on
    /// the calling thread; there are no further retries.
    pub fn render(
        &mut self,
        data: &[u8],
        options: &RenderOptions,
    ) -> OperationResult<Vec<RenderedPage>> {
        match self.render_in_worker(data, options) {
            Ok(result) => result,
            Err(failure) => {
                warn!(error = %failure, "render worker failed, rendering on the calling thread");
                self.worker = None;
                let mut rasterizer = (self.factory)();
                render_pages(data, options, rasterizer.as_mut())
            }
        }
    }

    /// Run one job in the worker. The outer error is the recoverable kind
    /// (timeout or crash); the inner result carries typed render outcomes.
    fn render_in_worker(
        &mut self,
        data: &[u8],
        options: &RenderOptions,
    ) -> Result<OperationResult<Vec<RenderedPage>>, OperationError> {
        if self.worker.is_none() {
            self.worker = Some(WorkerHandle::spawn((self.factory)()));
        }
        let Some(worker) = self.worker.as_ref() else {
            return Err(OperationError::RenderWorkerCrash(
                "render worker unavailable".to_string(),
            ));
        };

        let (reply_sender, reply_receiver) = mpsc::channel();
        let job = RenderJob {
            // The worker keeps its own copy; the original stays with the
            // caller for the fallback path.
            data: data.to_vec(),
            options: options.clone(),
            reply: reply_sender,
        };
        worker.sender.send(job).map_err(|_| {
            OperationError::RenderWorkerCrash("render worker channel closed".to_string())
        })?;

        match reply_receiver.recv_timeout(self.timeout) {
            Ok(result) => Ok(result),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(OperationError::RenderTimeout),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(OperationError::RenderWorkerCrash(
                "render worker thread terminated".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_pdf, FailingRasterizer, FlatRasterizer};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Panics on the first render call process-wide, then behaves like
    /// [`FlatRasterizer`]. Used to kill the worker exactly once.
    struct PanicOnce {
        armed: Arc<AtomicBool>,
        inner: FlatRasterizer,
    }

    impl PageRasterizer for PanicOnce {
        fn render_page(
            &mut self,
            data: &[u8],
            index: usize,
            scale: f32,
        ) -> OperationResult<image::RgbImage> {
            if self.armed.swap(false, Ordering::SeqCst) {
                panic!("injected rasterizer failure");
            }
            self.inner.render_page(data, index, scale)
        }
    }

    /// Sleeps past the deadline on the first render call, then renders
    /// normally.
    struct StallOnce {
        armed: Arc<AtomicBool>,
        delay: Duration,
        inner: FlatRasterizer,
    }

    impl PageRasterizer for StallOnce {
        fn render_page(
            &mut self,
            data: &[u8],
            index: usize,
            scale: f32,
        ) -> OperationResult<image::RgbImage> {
            if self.armed.swap(false, Ordering::SeqCst) {
                thread::sleep(self.delay);
            }
            self.inner.render_page(data, index, scale)
        }
    }

    #[test]
    fn test_worker_output_matches_direct_rendering() {
        let pdf = sample_pdf(2);
        let options = RenderOptions {
            dpi: 72.0,
            ..RenderOptions::default()
        };

        let mut client = RenderClient::new(|| Box::new(FlatRasterizer) as Box<dyn PageRasterizer>);
        let via_worker = client.render(&pdf, &options).unwrap();

        let mut direct = FlatRasterizer;
        let direct_pages = render_pages(&pdf, &options, &mut direct).unwrap();

        assert_eq!(via_worker.len(), direct_pages.len());
        for (a, b) in via_worker.iter().zip(&direct_pages) {
            assert_eq!(a.index, b.index);
            assert_eq!((a.width, a.height), (b.width, b.height));
            assert_eq!(a.bytes, b.bytes);
        }
    }

    #[test]
    fn test_worker_is_reused_across_calls() {
        let instances = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&instances);

        let mut client = RenderClient::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(FlatRasterizer) as Box<dyn PageRasterizer>
        });

        let pdf = sample_pdf(1);
        let options = RenderOptions::default();
        client.render(&pdf, &options).unwrap();
        client.render(&pdf, &options).unwrap();

        assert_eq!(instances.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fallback_after_worker_panic() {
        let armed = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&armed);

        let mut client = RenderClient::new(move || {
            Box::new(PanicOnce {
                armed: Arc::clone(&flag),
                inner: FlatRasterizer,
            }) as Box<dyn PageRasterizer>
        });

        let pdf = sample_pdf(2);
        let pages = client.render(&pdf, &RenderOptions::default()).unwrap();
        assert_eq!(pages.len(), 2);
        // the panic consumed the armed flag before the fallback ran
        assert!(!armed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fallback_after_timeout() {
        let armed = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&armed);

        let mut client = RenderClient::new(move || {
            Box::new(StallOnce {
                armed: Arc::clone(&flag),
                delay: Duration::from_millis(500),
                inner: FlatRasterizer,
            }) as Box<dyn PageRasterizer>
        })
        .with_timeout(Duration::from_millis(25));

        let pdf = sample_pdf(1);
        let pages = client.render(&pdf, &RenderOptions::default()).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_typed_errors_skip_the_fallback() {
        let instances = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&instances);

        let mut client = RenderClient::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(FailingRasterizer) as Box<dyn PageRasterizer>
        });

        let pdf = sample_pdf(1);
        let result = client.render(&pdf, &RenderOptions::default());
        assert!(matches!(result, Err(OperationError::Codec(_))));
        // A deterministic failure must not spawn a second rasterizer
        assert_eq!(instances.load(Ordering::SeqCst), 1);
    }
}
