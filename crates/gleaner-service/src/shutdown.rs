use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};

use http::{Request, Response, StatusCode};
use http_body::Body;
use pin_project::pin_project;
use tokio::sync::Notify;
use tower::{Layer, Service};

/// Shutdown flag plus a count of requests still being served.
#[derive(Clone, Default)]
pub struct ShutdownState {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    is_shutting_down: AtomicBool,
    in_flight_count: AtomicUsize,
    drained: Notify,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop admitting requests. New requests get 503.
    pub fn start_shutdown(&self) {
        self.inner.is_shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.is_shutting_down.load(Ordering::SeqCst)
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight_count.load(Ordering::SeqCst)
    }

    /// Resolves once no request is in flight.
    pub fn completed(&self) -> impl Future<Output = ()> + Send + 'static {
        let state = self.clone();
        async move {
            loop {
                // register before checking so a release in between is not missed
                let drained = state.inner.drained.notified();
                if state.in_flight_count() == 0 {
                    return;
                }
                drained.await;
            }
        }
    }

    fn enter(&self) -> InFlightGuard {
        self.inner.in_flight_count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            state: self.clone(),
        }
    }
}

/// Counts one request as in flight until dropped, whether the request
/// completed or its future was cancelled.
struct InFlightGuard {
    state: ShutdownState,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let inner = &self.state.inner;
        if inner.in_flight_count.fetch_sub(1, Ordering::SeqCst) == 1 {
            inner.drained.notify_waiters();
        }
    }
}

/// Tower layer that rejects requests once shutdown starts and tracks the rest.
#[derive(Clone)]
pub struct GracefulShutdownLayer {
    state: ShutdownState,
}

impl GracefulShutdownLayer {
    pub fn new(state: ShutdownState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for GracefulShutdownLayer {
    type Service = GracefulShutdownService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GracefulShutdownService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GracefulShutdownService<S> {
    inner: S,
    state: ShutdownState,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for GracefulShutdownService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body + Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = GracefulShutdownFuture<S::Future, ResBody, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if self.state.is_shutting_down() {
            let mut response = Response::new(ResBody::default());
            *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;

            return GracefulShutdownFuture {
                kind: FutureKind::Immediate(Some(Ok(response))),
                guard: None,
            };
        }

        let guard = self.state.enter();
        GracefulShutdownFuture {
            kind: FutureKind::Inner(self.inner.call(req)),
            guard: Some(guard),
        }
    }
}

#[pin_project]
pub struct GracefulShutdownFuture<F, B, E> {
    #[pin]
    kind: FutureKind<F, B, E>,
    guard: Option<InFlightGuard>,
}

#[pin_project(project = FutureKindProj)]
enum FutureKind<F, B, E> {
    Inner(#[pin] F),
    Immediate(Option<Result<Response<B>, E>>),
}

impl<F, B, E> Future for GracefulShutdownFuture<F, B, E>
where
    F: Future<Output = Result<Response<B>, E>>,
    B: Body,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        match this.kind.project() {
            FutureKindProj::Inner(fut) => {
                let result = fut.poll(cx);
                if result.is_ready() {
                    this.guard.take();
                }
                result
            }
            FutureKindProj::Immediate(response) => Poll::Ready(
                response
                    .take()
                    .expect("GracefulShutdownFuture polled after completion"),
            ),
        }
    }
}
