//! 测试夹具：记录全部交互的传输桩与脚本化退避。

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use spark_endpoint::{
    AddressGroup, BackoffProvider, BackoffSession, ConnectionManager, ManualTimer,
};
use spark_transport::{
    ClientStream, ClientTransport, EndpointAddress, Metadata, MethodDescriptor, MethodKind,
    Status, StatusCode, StreamListener, StreamTransport, TransportFactory, TransportListener,
};

pub const AUTHORITY: &str = "orders.test";

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

pub fn method(name: &str) -> MethodDescriptor {
    MethodDescriptor::new(MethodKind::Unary, format!("/orders.OrderService/{name}"))
}

pub fn headers(request_id: &'static str) -> Metadata {
    let mut headers = Metadata::new();
    headers.append("x-request-id", Bytes::from_static(request_id.as_bytes()));
    headers
}

/// 记录每次 `new_transport` 的工厂。
///
/// - `auto_ready` 打开时，连接在 `start` 内同步回报就绪，用于验证管理器在锁外执行副作用；
/// - 创建新连接时若仍有先前的连接未结束（既未失败也未终止），计入 `overlapping`。
#[derive(Default)]
pub struct RecordingFactory {
    created: Mutex<Vec<Arc<RecordingTransport>>>,
    auto_ready: bool,
    overlapping: AtomicUsize,
}

impl RecordingFactory {
    pub fn auto_ready() -> Self {
        Self {
            auto_ready: true,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn transport(&self, index: usize) -> Arc<RecordingTransport> {
        Arc::clone(&self.created.lock()[index])
    }

    pub fn latest(&self) -> Option<Arc<RecordingTransport>> {
        self.created.lock().last().cloned()
    }

    pub fn all(&self) -> Vec<Arc<RecordingTransport>> {
        self.created.lock().clone()
    }

    /// 与未结束的连接同时存在过的新建连接次数。
    pub fn overlapping(&self) -> usize {
        self.overlapping.load(Ordering::SeqCst)
    }

    pub fn ports(&self) -> Vec<u16> {
        self.created
            .lock()
            .iter()
            .map(|transport| transport.address.port())
            .collect()
    }
}

impl TransportFactory for RecordingFactory {
    fn new_transport(&self, address: &EndpointAddress, authority: &str) -> Arc<dyn ClientTransport> {
        let mut created = self.created.lock();
        if created.iter().any(|previous| !previous.is_settled()) {
            self.overlapping.fetch_add(1, Ordering::SeqCst);
        }
        let transport = Arc::new(RecordingTransport {
            index: created.len(),
            address: address.clone(),
            authority: authority.to_owned(),
            auto_ready: self.auto_ready,
            listener: Mutex::new(None),
            settled: AtomicBool::new(false),
            shutdowns: AtomicUsize::new(0),
            streams: Mutex::new(Vec::new()),
        });
        created.push(Arc::clone(&transport));
        transport
    }
}

pub struct RecordingTransport {
    index: usize,
    pub address: EndpointAddress,
    pub authority: String,
    auto_ready: bool,
    listener: Mutex<Option<Arc<dyn TransportListener>>>,
    settled: AtomicBool,
    shutdowns: AtomicUsize,
    streams: Mutex<Vec<(String, Metadata, Arc<RecordingStream>)>>,
}

impl RecordingTransport {
    fn listener(&self) -> Arc<dyn TransportListener> {
        self.listener
            .lock()
            .clone()
            .expect("transport was never started")
    }

    pub fn is_started(&self) -> bool {
        self.listener.lock().is_some()
    }

    pub fn ready(&self) {
        self.listener().transport_ready();
    }

    /// 已回报失败或终止。
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::SeqCst)
    }

    pub fn fail(&self) {
        self.settled.store(true, Ordering::SeqCst);
        self.listener()
            .transport_shutdown(Status::unavailable("connection refused"));
    }

    pub fn terminate(&self) {
        self.settled.store(true, Ordering::SeqCst);
        self.listener().transport_terminated();
    }

    /// 先回报关闭再回报终止，模拟一次完整的连接结束。
    pub fn close(&self) {
        self.fail();
        self.terminate();
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn stream_count(&self) -> usize {
        self.streams.lock().len()
    }

    pub fn stream_methods(&self) -> Vec<String> {
        self.streams
            .lock()
            .iter()
            .map(|(method, _, _)| method.clone())
            .collect()
    }

    pub fn stream(&self, index: usize) -> Arc<RecordingStream> {
        Arc::clone(&self.streams.lock()[index].2)
    }

    pub fn stream_headers(&self, index: usize) -> Metadata {
        self.streams.lock()[index].1.clone()
    }
}

impl StreamTransport for RecordingTransport {
    fn new_stream(&self, method: MethodDescriptor, headers: Metadata) -> Arc<dyn ClientStream> {
        let stream = Arc::new(RecordingStream::default());
        self.streams.lock().push((
            method.full_name().to_owned(),
            headers,
            Arc::clone(&stream),
        ));
        stream
    }
}

impl ClientTransport for RecordingTransport {
    fn id(&self) -> Cow<'_, str> {
        Cow::Owned(format!("recording-{}", self.index))
    }

    fn start(&self, listener: Arc<dyn TransportListener>) {
        *self.listener.lock() = Some(Arc::clone(&listener));
        if self.auto_ready {
            listener.transport_ready();
        }
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingStream {
    ops: Mutex<Vec<String>>,
}

impl RecordingStream {
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }
}

impl ClientStream for RecordingStream {
    fn start(&self, _listener: Box<dyn StreamListener>) {
        self.ops.lock().push("start".into());
    }

    fn write_message(&self, message: Bytes) {
        self.ops
            .lock()
            .push(format!("message:{}", String::from_utf8_lossy(&message)));
    }

    fn half_close(&self) {
        self.ops.lock().push("half_close".into());
    }

    fn cancel(&self, status: Status) {
        self.ops.lock().push(format!("cancel:{}", status.code()));
    }
}

/// 收集流结束状态的监听器。
#[derive(Clone, Default)]
pub struct ClosedLog(Arc<Mutex<Vec<StatusCode>>>);

impl ClosedLog {
    pub fn listener(&self) -> Box<dyn StreamListener> {
        Box::new(self.clone())
    }

    pub fn closed_count(&self) -> usize {
        self.0.lock().len()
    }

    pub fn codes(&self) -> Vec<StatusCode> {
        self.0.lock().clone()
    }
}

impl StreamListener for ClosedLog {
    fn on_closed(&self, status: Status) {
        self.0.lock().push(status.code());
    }
}

/// 每个会话依次给出 10ms、100ms，之后保持 100ms；记录每个会话被询问的次数。
#[derive(Default)]
pub struct ScriptedBackoff {
    sessions: Mutex<Vec<Arc<AtomicUsize>>>,
}

impl ScriptedBackoff {
    pub fn sessions_created(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn consulted(&self, session: usize) -> usize {
        self.sessions.lock()[session].load(Ordering::SeqCst)
    }
}

struct ScriptedSession {
    consulted: Arc<AtomicUsize>,
}

impl BackoffSession for ScriptedSession {
    fn next_delay(&mut self) -> Duration {
        match self.consulted.fetch_add(1, Ordering::SeqCst) {
            0 => ms(10),
            _ => ms(100),
        }
    }
}

impl BackoffProvider for ScriptedBackoff {
    fn new_session(&self) -> Box<dyn BackoffSession> {
        let consulted = Arc::new(AtomicUsize::new(0));
        self.sessions.lock().push(Arc::clone(&consulted));
        Box::new(ScriptedSession { consulted })
    }
}

pub struct Harness {
    pub manager: ConnectionManager,
    pub factory: Arc<RecordingFactory>,
    pub backoff: Arc<ScriptedBackoff>,
    pub timer: ManualTimer,
    terminated: Arc<AtomicUsize>,
}

impl Harness {
    /// 以端口 `9000..9000+size` 的主机名地址构造夹具。
    pub fn new(size: u16) -> Self {
        Self::with_factory(size, RecordingFactory::default())
    }

    pub fn with_factory(size: u16, factory: RecordingFactory) -> Self {
        let group = AddressGroup::new(
            AUTHORITY,
            (0..size).map(|offset| EndpointAddress::named("orders-backend", 9000 + offset)),
        )
        .expect("non-empty group");
        let factory = Arc::new(factory);
        let backoff = Arc::new(ScriptedBackoff::default());
        let timer = ManualTimer::new();
        let terminated = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&terminated);
        let manager = ConnectionManager::builder(AUTHORITY, group)
            .with_transport_factory(Arc::clone(&factory) as Arc<dyn TransportFactory>)
            .with_backoff(Arc::clone(&backoff) as Arc<dyn BackoffProvider>)
            .with_timer(Arc::new(timer.clone()))
            .on_terminated(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .expect("all collaborators supplied");
        Self {
            manager,
            factory,
            backoff,
            timer,
            terminated,
        }
    }

    pub fn terminations(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn transport(&self, index: usize) -> Arc<RecordingTransport> {
        self.factory.transport(index)
    }
}
