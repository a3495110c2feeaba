//! Server-side runtime: the skeleton lifecycle, its accept loop and the
//! per-connection request handler.
//!
//! A [`Skeleton`] owns a dispatch table wrapping the user's server object
//! and a listening endpoint. `start` binds the endpoint and detaches a
//! listening task; every accepted connection is handed to its own worker
//! task, which reads one request, invokes the server object and writes one
//! response. `stop` signals the listening task and returns without waiting
//! for in-flight workers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::watch;

use crate::addr::RemoteAddr;
use crate::codec;
use crate::error::{RemoteError, RmiError};
use crate::interface::{self, InterfaceDescriptor};
use crate::proto::{Request, Response};

const LISTEN_BACKLOG: u32 = 1024;

/// Routes decoded requests to a server object.
///
/// Implementations are derived per remote interface by the
/// [`remote_interface`](crate::remote_interface) macro; the skeleton itself
/// only sees this dynamic contract. `dispatch` returns `Err` for dispatch
/// failures (unresolvable method, undecodable argument), which the worker
/// reports to the client as an `ERROR` response and to the
/// [`SkeletonHooks::service_error`] hook. An error raised by the server
/// object is not a dispatch failure; it comes back as
/// `Ok(Response::Exception(..))`.
#[async_trait]
pub trait Dispatch: Send + Sync + 'static {
    /// Descriptor of the interface this table serves.
    fn interface(&self) -> &'static InterfaceDescriptor;

    /// Resolve the request's target method and invoke it.
    async fn dispatch(&self, request: Request) -> Result<Response, RmiError>;
}

/// Callback trio for skeleton lifecycle and error reporting.
///
/// All hooks default to the conservative behavior: `stopped` does nothing,
/// `listen_error` requests shutdown, `service_error` does nothing.
pub trait SkeletonHooks: Send + Sync + 'static {
    /// Invoked exactly once per running session, from the listening task,
    /// after the accept loop exits. `cause` is the error that tore the
    /// loop down, or `None` after an orderly `stop`.
    ///
    /// Runs while the skeleton's own lock is held: do not call `start` or
    /// `stop` on the same skeleton from inside this hook, and keep the
    /// body non-blocking.
    fn stopped(&self, _cause: Option<&RmiError>) {}

    /// Invoked from the listening task when `accept` fails while the
    /// skeleton is still running. Return `true` to resume accepting,
    /// `false` to shut down (in which case `stopped` receives the error).
    fn listen_error(&self, _error: &RmiError) -> bool {
        false
    }

    /// Invoked from a worker task when a dispatch-level error occurs.
    /// Must not call `stop`.
    fn service_error(&self, _error: &RmiError) {}
}

/// Hook set keeping every default.
#[derive(Debug, Default)]
pub struct DefaultHooks;

impl SkeletonHooks for DefaultHooks {}

/// A multi-connection invocation server for one remote interface.
pub struct Skeleton {
    shared: Arc<Shared>,
}

struct Shared {
    dispatch: Arc<dyn Dispatch>,
    hooks: Arc<dyn SkeletonHooks>,
    lifecycle: Mutex<Lifecycle>,
}

struct Lifecycle {
    running: bool,
    /// Effective address once known: the configured one, with a
    /// system-assigned port captured back in on first bind.
    addr: Option<RemoteAddr>,
    shutdown: Option<watch::Sender<bool>>,
}

impl Skeleton {
    /// Skeleton with a system-chosen address, assigned on `start`.
    pub fn new(dispatch: impl Dispatch) -> Self {
        Self::with_hooks(dispatch, None, DefaultHooks)
    }

    /// Skeleton bound to a fixed address (a zero port is still replaced by
    /// a system-assigned one on first `start`).
    pub fn with_addr(dispatch: impl Dispatch, addr: RemoteAddr) -> Self {
        Self::with_hooks(dispatch, Some(addr), DefaultHooks)
    }

    /// Full form with an injected hook set.
    ///
    /// Panics if the dispatch table's interface descriptor fails the
    /// remote-interface predicate.
    pub fn with_hooks(
        dispatch: impl Dispatch,
        addr: Option<RemoteAddr>,
        hooks: impl SkeletonHooks,
    ) -> Self {
        interface::validate(dispatch.interface());
        Self {
            shared: Arc::new(Shared {
                dispatch: Arc::new(dispatch),
                hooks: Arc::new(hooks),
                lifecycle: Mutex::new(Lifecycle {
                    running: false,
                    addr,
                    shutdown: None,
                }),
            }),
        }
    }

    pub fn interface(&self) -> &'static InterfaceDescriptor {
        self.shared.dispatch.interface()
    }

    /// The effective address.
    ///
    /// Panics if the skeleton was constructed without an address and has
    /// not been started yet.
    pub fn address(&self) -> RemoteAddr {
        self.shared
            .lifecycle
            .lock()
            .unwrap()
            .addr
            .clone()
            .expect("skeleton has no address: none configured and not yet started")
    }

    pub fn is_running(&self) -> bool {
        self.shared.lifecycle.lock().unwrap().running
    }

    /// Bind the listening endpoint and detach the listening task.
    ///
    /// Must be called from within a tokio runtime. Fails if the skeleton
    /// is already running or the endpoint cannot be bound; on failure the
    /// skeleton stays idle and may be started again.
    pub fn start(&self) -> Result<(), RmiError> {
        let mut lifecycle = self.shared.lifecycle.lock().unwrap();
        if lifecycle.running {
            return Err(RmiError::new("server is already running"));
        }

        let bind_to = lifecycle.addr.clone().unwrap_or_else(|| RemoteAddr::wildcard(0));
        let listener = bind(&bind_to)?;
        let bound_port = listener.local_addr().map_err(RmiError::from)?.port();

        // capture a system-assigned port before any stub can see the
        // address, so the identity stays stable across restarts
        let captured = match &lifecycle.addr {
            None => Some(RemoteAddr::wildcard(bound_port)),
            Some(a) if a.port() == 0 => Some(RemoteAddr::new(a.host(), bound_port)),
            Some(_) => None,
        };
        if let Some(addr) = captured {
            lifecycle.addr = Some(addr);
        }

        let (tx, rx) = watch::channel(false);
        lifecycle.shutdown = Some(tx);
        lifecycle.running = true;

        log::info!(
            "skeleton for {} listening on {}",
            self.interface().name,
            lifecycle.addr.as_ref().unwrap()
        );

        tokio::spawn(accept_loop(Arc::clone(&self.shared), listener, rx));
        Ok(())
    }

    /// Signal the listening task to shut down. Idempotent when idle.
    ///
    /// In-flight workers keep running until their current invocation
    /// returns; the skeleton counts as stopped once the listening task has
    /// observed the signal and invoked the `stopped` hook. It may then be
    /// started again and will reuse its effective address.
    pub fn stop(&self) {
        let mut lifecycle = self.shared.lifecycle.lock().unwrap();
        if !lifecycle.running {
            return;
        }
        lifecycle.running = false;
        if let Some(shutdown) = lifecycle.shutdown.take() {
            let _ = shutdown.send(true);
        }
    }
}

impl Shared {
    fn is_running(&self) -> bool {
        self.lifecycle.lock().unwrap().running
    }

    /// stop-equivalent used by the listening task on a fatal accept error
    fn shut_down(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        lifecycle.running = false;
        lifecycle.shutdown = None;
    }
}

fn bind(addr: &RemoteAddr) -> Result<TcpListener, RmiError> {
    use std::net::ToSocketAddrs;

    let sockaddr = (addr.host(), addr.port())
        .to_socket_addrs()
        .map_err(|e| RmiError::with_cause(format!("cannot resolve {}", addr), &e))?
        .next()
        .ok_or_else(|| RmiError::new(format!("cannot resolve {}", addr)))?;

    let socket = match sockaddr {
        std::net::SocketAddr::V4(_) => TcpSocket::new_v4(),
        std::net::SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(RmiError::from)?;
    // restarts rebind the captured port while old connections may still be
    // draining
    socket.set_reuseaddr(true).map_err(RmiError::from)?;
    socket
        .bind(sockaddr)
        .map_err(|e| RmiError::with_cause(format!("cannot bind {}", addr), &e))?;
    socket.listen(LISTEN_BACKLOG).map_err(RmiError::from)
}

async fn accept_loop(
    shared: Arc<Shared>,
    listener: TcpListener,
    mut shutdown: watch::Receiver<bool>,
) {
    let cause = loop {
        tokio::select! {
            _ = shutdown.changed() => break None,
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    log::debug!("accepted connection from {}", peer);
                    let worker = Arc::clone(&shared);
                    tokio::spawn(async move {
                        serve_connection(socket, worker).await;
                    });
                }
                Err(e) => {
                    if !shared.is_running() {
                        break None;
                    }
                    let error = RmiError::with_cause("accept failed", &e);
                    log::error!("{}", error);
                    if shared.hooks.listen_error(&error) {
                        continue;
                    }
                    shared.shut_down();
                    break Some(error);
                }
            }
        }
    };

    // close the listening socket before reporting shutdown, so a restart
    // can rebind immediately
    drop(listener);

    let lifecycle = shared.lifecycle.lock().unwrap();
    shared.hooks.stopped(cause.as_ref());
    drop(lifecycle);
}

/// Handle one accepted connection: one request in, one response out.
async fn serve_connection(mut socket: TcpStream, shared: Arc<Shared>) {
    let mut buf = Vec::new();
    if let Err(e) = socket.read_to_end(&mut buf).await {
        // the client observes the broken connection on its own side
        shared
            .hooks
            .service_error(&RmiError::with_cause("failed to read request", &e));
        return;
    }

    let response = match decode_request(&buf) {
        Ok(request) => {
            log::debug!("dispatching {}", request.method);
            match shared.dispatch.dispatch(request).await {
                Ok(response) => response,
                Err(error) => {
                    log::error!("dispatch failed: {}", error);
                    shared.hooks.service_error(&error);
                    Response::Error(error)
                }
            }
        }
        Err(error) => {
            log::error!("{}", error);
            shared.hooks.service_error(&error);
            Response::Error(error)
        }
    };

    match codec::encode(&response) {
        Ok(frame) => {
            if let Err(e) = socket.write_all(&frame).await {
                shared
                    .hooks
                    .service_error(&RmiError::with_cause("failed to write response", &e));
                return;
            }
            let _ = socket.shutdown().await;
        }
        Err(error) => shared.hooks.service_error(&error),
    }
}

fn decode_request(buf: &[u8]) -> Result<Request, RmiError> {
    let request: Request =
        codec::decode(buf).map_err(|_| RmiError::new("invalid request object"))?;
    request.check()?;
    Ok(request)
}

/// Encode a server object's result as a response.
///
/// Used by generated dispatch tables: a success becomes `NORMAL`, an error
/// raised by the method body becomes `EXCEPTION` with the whole raised
/// value as payload. Only an encoding failure escapes as a dispatch error.
pub fn encode_outcome<R, E>(outcome: Result<R, RemoteError<E>>) -> Result<Response, RmiError>
where
    R: Serialize,
    E: Serialize,
{
    match outcome {
        Ok(value) => Ok(Response::Normal(codec::encode(&value)?)),
        Err(raised) => Ok(Response::Exception(codec::encode(&raised)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::MethodDescriptor;
    use crate::stub::StubHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    static ECHO: InterfaceDescriptor = InterfaceDescriptor {
        name: "Echo",
        methods: &[MethodDescriptor {
            name: "echo",
            param_types: &["String"],
            return_type: "String",
            declares_rmi_error: true,
        }],
    };

    struct EchoDispatch;

    #[async_trait]
    impl Dispatch for EchoDispatch {
        fn interface(&self) -> &'static InterfaceDescriptor {
            &ECHO
        }

        async fn dispatch(&self, request: Request) -> Result<Response, RmiError> {
            interface::resolve_method(&ECHO, &request)?;
            let text: String = codec::decode(&request.args[0])?;
            encode_outcome::<String, ()>(Ok(text))
        }
    }

    #[derive(Clone, Default)]
    struct CountingHooks {
        stopped: Arc<AtomicUsize>,
        stopped_with_cause: Arc<AtomicUsize>,
        service_errors: Arc<AtomicUsize>,
    }

    impl SkeletonHooks for CountingHooks {
        fn stopped(&self, cause: Option<&RmiError>) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            if cause.is_some() {
                self.stopped_with_cause.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn service_error(&self, _error: &RmiError) {
            self.service_errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn local_skeleton(hooks: CountingHooks) -> Skeleton {
        Skeleton::with_hooks(EchoDispatch, Some(RemoteAddr::new("127.0.0.1", 0)), hooks)
    }

    fn echo_handle(skeleton: &Skeleton) -> StubHandle {
        StubHandle::new(&ECHO, skeleton.address())
    }

    async fn wait_for(counter: &Arc<AtomicUsize>, at_least: usize) {
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) >= at_least {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("hook was not invoked in time");
    }

    #[tokio::test]
    async fn test_port_zero_gets_effective_port() {
        let skeleton = local_skeleton(CountingHooks::default());
        skeleton.start().unwrap();
        assert_ne!(skeleton.address().port(), 0);
        skeleton.stop();
    }

    #[tokio::test]
    async fn test_address_before_start_panics() {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            Skeleton::new(EchoDispatch).address();
        }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let skeleton = local_skeleton(CountingHooks::default());
        skeleton.start().unwrap();
        assert!(skeleton.start().is_err());
        skeleton.stop();
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_a_no_op() {
        let hooks = CountingHooks::default();
        let skeleton = local_skeleton(hooks.clone());
        skeleton.stop();
        skeleton.stop();
        assert_eq!(hooks.stopped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let skeleton = local_skeleton(CountingHooks::default());
        skeleton.start().unwrap();

        let handle = echo_handle(&skeleton);
        let method = &ECHO.methods[0];
        let args = vec![codec::encode(&"hello".to_owned()).unwrap()];
        let reply: Result<String, RemoteError<()>> = handle.call(method, args).await;

        assert_eq!(reply.unwrap(), "hello");
        skeleton.stop();
    }

    #[tokio::test]
    async fn test_restart_keeps_effective_address() {
        let hooks = CountingHooks::default();
        let skeleton = local_skeleton(hooks.clone());

        skeleton.start().unwrap();
        let first = skeleton.address();

        skeleton.stop();
        wait_for(&hooks.stopped, 1).await;
        assert_eq!(hooks.stopped_with_cause.load(Ordering::SeqCst), 0);
        assert!(!skeleton.is_running());

        skeleton.start().unwrap();
        assert_eq!(skeleton.address(), first);

        // still serving after the restart
        let handle = echo_handle(&skeleton);
        let args = vec![codec::encode(&"again".to_owned()).unwrap()];
        let reply: Result<String, RemoteError<()>> = handle.call(&ECHO.methods[0], args).await;
        assert_eq!(reply.unwrap(), "again");

        skeleton.stop();
        wait_for(&hooks.stopped, 2).await;
    }

    #[tokio::test]
    async fn test_malformed_request_yields_error_response() {
        let hooks = CountingHooks::default();
        let skeleton = local_skeleton(hooks.clone());
        skeleton.start().unwrap();
        let addr = skeleton.address();

        let mut raw = TcpStream::connect((addr.host(), addr.port())).await.unwrap();
        raw.write_all(b"definitely not an invocation").await.unwrap();
        raw.shutdown().await.unwrap();
        let mut buf = Vec::new();
        raw.read_to_end(&mut buf).await.unwrap();

        match codec::decode::<Response>(&buf).unwrap() {
            Response::Error(e) => assert!(e.message().contains("invalid request")),
            other => panic!("expected an ERROR response, got {:?}", other),
        }
        wait_for(&hooks.service_errors, 1).await;
        assert_eq!(hooks.service_errors.load(Ordering::SeqCst), 1);
        assert!(skeleton.is_running());

        // the skeleton still serves well-formed requests
        let handle = echo_handle(&skeleton);
        let args = vec![codec::encode(&"alive".to_owned()).unwrap()];
        let reply: Result<String, RemoteError<()>> = handle.call(&ECHO.methods[0], args).await;
        assert_eq!(reply.unwrap(), "alive");

        skeleton.stop();
    }

    #[tokio::test]
    async fn test_unknown_method_yields_error_response() {
        static BOGUS: MethodDescriptor = MethodDescriptor {
            name: "missing",
            param_types: &[],
            return_type: "()",
            declares_rmi_error: true,
        };

        let hooks = CountingHooks::default();
        let skeleton = local_skeleton(hooks.clone());
        skeleton.start().unwrap();

        let handle = echo_handle(&skeleton);
        let reply: Result<(), RemoteError<()>> = handle.call(&BOGUS, vec![]).await;
        match reply {
            Err(RemoteError::Rmi(e)) => assert!(e.message().contains("no matching method")),
            other => panic!("expected a dispatch error, got {:?}", other),
        }
        wait_for(&hooks.service_errors, 1).await;

        skeleton.stop();
    }

    #[tokio::test]
    async fn test_invocation_against_dead_address_fails() {
        let free_port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };

        let handle = StubHandle::new(&ECHO, RemoteAddr::new("127.0.0.1", free_port));
        let args = vec![codec::encode(&"void".to_owned()).unwrap()];
        let reply: Result<String, RemoteError<()>> = handle.call(&ECHO.methods[0], args).await;

        match reply {
            Err(RemoteError::Rmi(e)) => assert!(e.message().contains("connection")),
            other => panic!("expected a transport error, got {:?}", other),
        }
    }
}
