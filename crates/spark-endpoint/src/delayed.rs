//! 延迟传输：连接尚未就绪时交给调用方的占位传输。
//!
//! # 教案式导航
//! - **定位（Where）**：由 [`ConnectionManager`](crate::ConnectionManager) 在建连或退避期间创建，
//!   以 [`TransportSlot::Buffered`](crate::TransportSlot::Buffered) 的形式返回给调用方；
//! - **动机（Why）**：`obtain_active_transport` 不允许阻塞，连接就绪前创建的流只能先缓冲，
//!   待真实连接就绪后按原顺序重放；若管理器停机且不再有连接，则以显式错误结束这些流，绝不静默丢弃；
//! - **契约（What）**：缓冲区恰好被“解析”一次：要么 [`resolve`](DelayedTransport::resolve) 重放到真实连接，
//!   要么 [`fail`](DelayedTransport::fail) 以给定状态结束全部缓冲流。

use std::mem;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use spark_transport::{
    ClientStream, ClientTransport, Metadata, MethodDescriptor, Status, StreamListener,
    StreamTransport,
};

/// 连接就绪前的占位传输。
///
/// # 教案式说明
/// - **意图 (Why)**：让调用方拿到的句柄在“类型”上立即确定，只有底层连接的就绪是异步的；
/// - **契约 (What)**：
///   - `new_stream` 永不阻塞、永远返回流句柄；缓冲期间返回的流处于缓冲态；
///   - 解析为真实连接后，后续 `new_stream` 直接转交真实连接；
///   - 解析为失败后，后续 `new_stream` 返回的流在 `start` 时立即以失败状态结束；
/// - **实现 (How)**：内部以互斥锁保护三态 [`BufferState`]，重放与失败通知均在释放锁之后执行，
///   避免回调重入时死锁。
///
/// 克隆只增加引用计数，所有克隆共享同一缓冲区。
#[derive(Clone)]
pub struct DelayedTransport {
    inner: Arc<Mutex<BufferState>>,
}

enum BufferState {
    Buffering(Vec<PendingStream>),
    Resolved(Arc<dyn ClientTransport>),
    Failed(Status),
}

struct PendingStream {
    method: MethodDescriptor,
    headers: Metadata,
    stream: DelayedStream,
}

impl DelayedTransport {
    /// 创建处于缓冲态的占位传输。
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BufferState::Buffering(Vec::new()))),
        }
    }

    /// 仍在等待重放且未被取消的建流请求数量。
    pub fn pending_streams(&self) -> usize {
        match &*self.inner.lock() {
            BufferState::Buffering(queue) => queue
                .iter()
                .filter(|pending| !pending.stream.is_closed())
                .count(),
            _ => 0,
        }
    }

    /// 是否已被解析（重放或失败）。
    pub fn is_resolved(&self) -> bool {
        !matches!(&*self.inner.lock(), BufferState::Buffering(_))
    }

    /// 判断两个句柄是否指向同一缓冲区。
    pub fn same_buffer(&self, other: &DelayedTransport) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 将全部缓冲请求按提交顺序重放到真实连接。
    ///
    /// # 契约说明（What）
    /// - 返回实际重放的流数量，已取消的请求被跳过；
    /// - 若缓冲区已被解析，本调用为空操作并返回 0。
    pub fn resolve(&self, transport: Arc<dyn ClientTransport>) -> usize {
        let queue = {
            let mut state = self.inner.lock();
            match &mut *state {
                BufferState::Buffering(queue) => {
                    let queue = mem::take(queue);
                    *state = BufferState::Resolved(Arc::clone(&transport));
                    queue
                }
                _ => return 0,
            }
        };

        let mut replayed = 0;
        for pending in queue {
            if pending.stream.is_closed() {
                continue;
            }
            let real = transport.new_stream(pending.method, pending.headers);
            pending.stream.attach(real);
            replayed += 1;
        }
        replayed
    }

    /// 以给定状态结束全部缓冲请求。
    ///
    /// 返回被结束的流数量；若缓冲区已被解析，本调用为空操作并返回 0。
    pub fn fail(&self, status: Status) -> usize {
        let queue = {
            let mut state = self.inner.lock();
            match &mut *state {
                BufferState::Buffering(queue) => {
                    let queue = mem::take(queue);
                    *state = BufferState::Failed(status.clone());
                    queue
                }
                _ => return 0,
            }
        };

        let mut failed = 0;
        for pending in queue {
            if pending.stream.close(status.clone()) {
                failed += 1;
            }
        }
        failed
    }
}

impl Default for DelayedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DelayedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.inner.lock() {
            BufferState::Buffering(queue) => format!("buffering({})", queue.len()),
            BufferState::Resolved(transport) => format!("resolved({})", transport.id()),
            BufferState::Failed(status) => format!("failed({status})"),
        };
        f.debug_struct("DelayedTransport")
            .field("state", &state)
            .finish()
    }
}

impl StreamTransport for DelayedTransport {
    fn new_stream(&self, method: MethodDescriptor, headers: Metadata) -> Arc<dyn ClientStream> {
        let mut state = self.inner.lock();
        match &mut *state {
            BufferState::Buffering(queue) => {
                let stream = DelayedStream::new();
                queue.push(PendingStream {
                    method,
                    headers,
                    stream: stream.clone(),
                });
                Arc::new(stream)
            }
            BufferState::Resolved(transport) => {
                let transport = Arc::clone(transport);
                drop(state);
                transport.new_stream(method, headers)
            }
            BufferState::Failed(status) => Arc::new(DelayedStream::closed(status.clone())),
        }
    }
}

/// 真实流就绪前的流句柄，按调用顺序缓冲全部操作。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `start`/`write_message`/`half_close` 在缓冲态下依序记录，挂接真实流后按原顺序重放；
///   - 缓冲态下 `cancel` 会把请求从重放中剔除，并以给定状态通知已登记的监听器；
///   - 挂接后所有操作直接转交真实流；
/// - **实现 (How)**：重放在锁外进行，重放期间新到的操作继续排队，直到队列清空才切换为直通，
///   以此保证调用顺序。
#[derive(Clone)]
pub struct DelayedStream {
    inner: Arc<Mutex<StreamSlot>>,
}

enum StreamSlot {
    Buffering(Vec<StreamOp>),
    Attached(Arc<dyn ClientStream>),
    Closed(Status),
}

enum StreamOp {
    Start(Box<dyn StreamListener>),
    Message(Bytes),
    HalfClose,
}

impl StreamOp {
    fn apply(self, stream: &dyn ClientStream) {
        match self {
            Self::Start(listener) => stream.start(listener),
            Self::Message(message) => stream.write_message(message),
            Self::HalfClose => stream.half_close(),
        }
    }
}

impl DelayedStream {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StreamSlot::Buffering(Vec::new()))),
        }
    }

    fn closed(status: Status) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StreamSlot::Closed(status))),
        }
    }

    /// 是否已挂接真实流。
    pub fn is_attached(&self) -> bool {
        matches!(&*self.inner.lock(), StreamSlot::Attached(_))
    }

    fn is_closed(&self) -> bool {
        matches!(&*self.inner.lock(), StreamSlot::Closed(_))
    }

    fn attach(&self, real: Arc<dyn ClientStream>) {
        loop {
            let ops = {
                let mut slot = self.inner.lock();
                match &mut *slot {
                    StreamSlot::Buffering(ops) if ops.is_empty() => {
                        *slot = StreamSlot::Attached(real);
                        return;
                    }
                    StreamSlot::Buffering(ops) => mem::take(ops),
                    StreamSlot::Closed(status) => {
                        // 重放途中被取消：已重放的部分需要在真实流上收尾。
                        let status = status.clone();
                        drop(slot);
                        real.cancel(status);
                        return;
                    }
                    StreamSlot::Attached(_) => return,
                }
            };
            for op in ops {
                op.apply(&*real);
            }
        }
    }

    /// 缓冲态下结束流；返回是否确实发生了状态迁移。
    fn close(&self, status: Status) -> bool {
        let ops = {
            let mut slot = self.inner.lock();
            match &mut *slot {
                StreamSlot::Buffering(ops) => {
                    let ops = mem::take(ops);
                    *slot = StreamSlot::Closed(status.clone());
                    ops
                }
                _ => return false,
            }
        };
        for op in ops {
            if let StreamOp::Start(listener) = op {
                listener.on_closed(status.clone());
            }
        }
        true
    }

    fn enqueue_or_forward(&self, op: StreamOp) {
        let mut slot = self.inner.lock();
        match &mut *slot {
            StreamSlot::Buffering(ops) => ops.push(op),
            StreamSlot::Attached(real) => {
                let real = Arc::clone(real);
                drop(slot);
                op.apply(&*real);
            }
            StreamSlot::Closed(status) => {
                if let StreamOp::Start(listener) = op {
                    let status = status.clone();
                    drop(slot);
                    listener.on_closed(status);
                }
            }
        }
    }
}

impl ClientStream for DelayedStream {
    fn start(&self, listener: Box<dyn StreamListener>) {
        self.enqueue_or_forward(StreamOp::Start(listener));
    }

    fn write_message(&self, message: Bytes) {
        self.enqueue_or_forward(StreamOp::Message(message));
    }

    fn half_close(&self) {
        self.enqueue_or_forward(StreamOp::HalfClose);
    }

    fn cancel(&self, status: Status) {
        if self.close(status.clone()) {
            return;
        }
        let real = match &*self.inner.lock() {
            StreamSlot::Attached(real) => Arc::clone(real),
            _ => return,
        };
        real.cancel(status);
    }
}
