use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use super::{RenderCompletion, RenderRequest};
use crate::render::{RenderError, RenderService};

/// Runs renders on a single background thread.
///
/// Requests that pile up while a render is in progress are collapsed to the
/// newest one. A render that has started is always allowed to finish; the
/// controller discards its result if it is stale.
pub struct RenderDispatcher {
    requests: Option<Sender<RenderRequest>>,
    completions: Receiver<RenderCompletion>,
    worker: Option<JoinHandle<()>>,
}

impl RenderDispatcher {
    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn new(service: Arc<dyn RenderService>) -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<RenderRequest>();
        let (done_tx, done_rx) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("render".to_string())
            .spawn(move || run_worker(&*service, &req_rx, &done_tx))?;
        Ok(Self {
            requests: Some(req_tx),
            completions: done_rx,
            worker: Some(worker),
        })
    }

    pub fn dispatch(&self, request: RenderRequest) {
        let generation = request.generation;
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok());
        if !sent {
            tracing::warn!(generation, "render worker is gone, request dropped");
        }
    }

    /// Finished renders, without blocking.
    pub fn try_completions(&self) -> Vec<RenderCompletion> {
        self.completions.try_iter().collect()
    }

    /// Wait up to `timeout` for the next finished render.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RenderCompletion> {
        match self.completions.recv_timeout(timeout) {
            Ok(done) => Some(done),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for RenderDispatcher {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!("render worker panicked");
        }
    }
}

fn run_worker(
    service: &dyn RenderService,
    requests: &Receiver<RenderRequest>,
    completions: &Sender<RenderCompletion>,
) {
    while let Ok(mut request) = requests.recv() {
        for newer in requests.try_iter() {
            tracing::debug!(
                skipped = request.generation,
                newer = newer.generation,
                "coalescing render request"
            );
            request = newer;
        }
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            service.render(&request.source, &request.options)
        }))
        .unwrap_or_else(|payload| {
            let reason = panic_reason(payload.as_ref());
            tracing::warn!(generation = request.generation, reason, "renderer panicked");
            Err(RenderError::Crashed(reason.to_string()))
        });
        if let Err(err) = &result {
            tracing::debug!(generation = request.generation, %err, "render failed");
        }
        let done = RenderCompletion {
            generation: request.generation,
            result,
        };
        if completions.send(done).is_err() {
            break;
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use super::*;
    use crate::render::{Artifact, RenderError, RenderOptions};
    use crate::theme::Theme;

    /// Records each call, then blocks until the test releases it.
    struct GatedService {
        calls: Arc<Mutex<Vec<String>>>,
        gate: Mutex<Receiver<()>>,
    }

    impl RenderService for GatedService {
        fn render(&self, source: &str, _: &RenderOptions) -> Result<Artifact, RenderError> {
            self.calls.lock().unwrap().push(source.to_string());
            self.gate.lock().unwrap().recv().unwrap();
            if source == "bad" {
                return Err(RenderError::syntax("boom"));
            }
            if source == "crash" {
                panic!("layout overflow");
            }
            Ok(Artifact {
                svg: source.to_string(),
                width: 1,
                height: 1,
            })
        }
    }

    fn request(generation: u64, source: &str) -> RenderRequest {
        RenderRequest {
            generation,
            source: source.to_string(),
            options: Theme::Light.render_options(),
        }
    }

    fn gated() -> (RenderDispatcher, Arc<Mutex<Vec<String>>>, Sender<()>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (gate_tx, gate_rx) = mpsc::channel();
        let service = GatedService {
            calls: Arc::clone(&calls),
            gate: Mutex::new(gate_rx),
        };
        (RenderDispatcher::new(Arc::new(service)).unwrap(), calls, gate_tx)
    }

    fn wait_for_calls(calls: &Mutex<Vec<String>>, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while calls.lock().unwrap().len() < n {
            assert!(Instant::now() < deadline, "worker never started render");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_dispatch_round_trip() {
        let (dispatcher, _calls, gate) = gated();
        gate.send(()).unwrap();
        dispatcher.dispatch(request(1, "graph TD"));
        let done = dispatcher.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(done.generation, 1);
        assert_eq!(done.result.unwrap().svg, "graph TD");
    }

    #[test]
    fn test_errors_come_back_as_completions() {
        let (dispatcher, _calls, gate) = gated();
        gate.send(()).unwrap();
        dispatcher.dispatch(request(7, "bad"));
        let done = dispatcher.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(done.result, Err(RenderError::Syntax("boom".to_string())));
    }

    #[test]
    fn test_queued_requests_coalesce_to_newest() {
        let (dispatcher, calls, gate) = gated();
        dispatcher.dispatch(request(1, "one"));
        wait_for_calls(&calls, 1);

        dispatcher.dispatch(request(2, "two"));
        dispatcher.dispatch(request(3, "three"));
        gate.send(()).unwrap();
        gate.send(()).unwrap();

        let first = dispatcher.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = dispatcher.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 3);
        assert_eq!(*calls.lock().unwrap(), vec!["one", "three"]);
    }

    #[test]
    fn test_try_completions_does_not_block() {
        let (dispatcher, _calls, gate) = gated();
        assert!(dispatcher.try_completions().is_empty());
        gate.send(()).unwrap();
        dispatcher.dispatch(request(1, "x"));
        let done = dispatcher.recv_timeout(Duration::from_secs(5));
        assert!(done.is_some());
        assert!(dispatcher.try_completions().is_empty());
    }

    #[test]
    fn test_backend_panic_becomes_error_and_worker_survives() {
        let (dispatcher, calls, gate) = gated();
        dispatcher.dispatch(request(1, "crash"));
        wait_for_calls(&calls, 1);
        gate.send(()).unwrap();

        let crashed = dispatcher.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(crashed.generation, 1);
        assert_eq!(
            crashed.result,
            Err(RenderError::Crashed("layout overflow".to_string()))
        );

        gate.send(()).unwrap();
        dispatcher.dispatch(request(2, "graph TD"));
        let done = dispatcher.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(done.generation, 2);
        assert_eq!(done.result.unwrap().svg, "graph TD");
    }
}
