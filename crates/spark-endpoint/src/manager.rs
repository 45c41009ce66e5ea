//! # ConnectionManager：单端点连接生命周期状态机
//!
//! ## 核心意图（Why）
//! - 决定何时建连、下一次连哪个地址、失败后等待多久，并在任何情况下都不阻塞调用方；
//! - 在停机时排空进行中的建连与缓冲的建流请求，之后恰好一次地发出终止通知。
//!
//! ## 行为契约（What）
//! - `obtain_active_transport`：按优先级返回 `None`（已停机）、就绪连接、或延迟传输；空闲时顺带发起建连；
//! - 建连失败：游标前进；未绕回圈头则立即尝试下一个地址，绕回圈头则询问退避会话并登记定时重连；
//! - 退避到期：仅当等待期间有调用方索取过传输、或缓冲区仍有请求时才发起建连；否则回到空闲并保留退避会话，
//!   下一次 `obtain_active_transport` 立即建连；
//! - 就绪连接关闭：圈头移到成功地址的下一位并丢弃退避会话，下一次建连按需（惰性）发起；
//! - `shutdown`：幂等；不中断进行中的建连；退避等待期间若缓冲区仍有请求，则让定时重连照常触发以排空请求。
//!
//! ## 并发模型（How）
//! - 全部状态由单个 `parking_lot::Mutex` 串行化，生命周期事件、定时回调与公开操作都经过这一入口；
//! - 锁内只做簿记并把对外副作用（启动连接、重放缓冲、关闭连接、终止通知）收集为 [`Effect`]，
//!   释放锁之后依次执行，因此协作方可以在回调中同步重入管理器；
//! - 事件与定时回调都携带尝试编号 / 代次，过期的回调在比对失败后直接忽略。
//!
//! ## 风险提示（Trade-offs）
//! - 传输工厂与退避提供者在锁内调用，实现不得回调管理器；
//! - 若某个连接从不回报 `Terminated`，管理器将停留在 `ShuttingDown`。

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use spark_transport::{
    ClientStream, ClientTransport, EndpointAddress, Metadata, MethodDescriptor, Status,
    StreamTransport, TransportEvent, TransportFactory, TransportListener,
};
use tracing::{debug, info, warn};

use crate::{
    AddressCycle, AddressGroup, BackoffProvider, BackoffSession, DelayedTransport,
    EndpointConfig, EndpointError, TimerHandle, TimerService,
};

/// 停机后仍未排空的缓冲流收到的错误描述。
pub const SHUTDOWN_MESSAGE: &str = "endpoint shut down before a transport became ready";

/// 退避到期且无人等待时，被丢弃的空缓冲区上迟到的建流请求收到的错误描述。
pub const IDLE_MESSAGE: &str = "reconnect backoff elapsed with no pending request";

/// 终止通知回调。
pub type TerminationHook = Box<dyn FnOnce() + Send + 'static>;

/// 连接管理器的停机状态，单调推进。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// 正常服务。
    Running,
    /// 已请求停机，等待进行中的连接与缓冲请求收尾。
    ShuttingDown,
    /// 全部连接已释放，终止通知已发出。
    Terminated,
}

/// `obtain_active_transport` 的返回值，在返回时种类即已确定。
///
/// # 契约说明（What）
/// - `Ready`：当前就绪的真实连接；
/// - `Buffered`：与进行中（建连或退避）的尝试绑定的延迟传输，多次调用返回同一缓冲区；
/// - 两种变体都实现 [`StreamTransport`]，调用方可以不区分种类直接建流。
#[derive(Clone)]
pub enum TransportSlot {
    /// 就绪连接。
    Ready(Arc<dyn ClientTransport>),
    /// 延迟传输。
    Buffered(DelayedTransport),
}

impl TransportSlot {
    /// 是否为就绪连接。
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// 若为就绪连接则返回之。
    pub fn ready_transport(&self) -> Option<&Arc<dyn ClientTransport>> {
        match self {
            Self::Ready(transport) => Some(transport),
            Self::Buffered(_) => None,
        }
    }

    /// 若为延迟传输则返回之。
    pub fn delayed(&self) -> Option<&DelayedTransport> {
        match self {
            Self::Ready(_) => None,
            Self::Buffered(delayed) => Some(delayed),
        }
    }
}

impl StreamTransport for TransportSlot {
    fn new_stream(&self, method: MethodDescriptor, headers: Metadata) -> Arc<dyn ClientStream> {
        match self {
            Self::Ready(transport) => transport.new_stream(method, headers),
            Self::Buffered(delayed) => delayed.new_stream(method, headers),
        }
    }
}

impl fmt::Debug for TransportSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(transport) => f.debug_tuple("Ready").field(&transport.id()).finish(),
            Self::Buffered(delayed) => f.debug_tuple("Buffered").field(delayed).finish(),
        }
    }
}

/// 连接管理器构造器。
///
/// # 教案式说明
/// - **意图 (Why)**：协作方较多（传输工厂、退避提供者、定时器、终止回调），以 `with_*` 链式方法逐个注入，
///   在 `build` 时集中校验；
/// - **契约 (What)**：传输工厂与退避提供者必填；定时器在启用 `runtime-tokio` 且处于 Tokio 运行时上下文时
///   默认使用 [`TokioTimer`](crate::TokioTimer)，否则必填；终止回调可选。
pub struct ConnectionManagerBuilder {
    authority: String,
    group: AddressGroup,
    factory: Option<Arc<dyn TransportFactory>>,
    backoff: Option<Arc<dyn BackoffProvider>>,
    timer: Option<Arc<dyn TimerService>>,
    on_terminated: Option<TerminationHook>,
}

impl ConnectionManagerBuilder {
    /// 以端点身份与地址组创建构造器。
    pub fn new(authority: impl Into<String>, group: AddressGroup) -> Self {
        Self {
            authority: authority.into(),
            group,
            factory: None,
            backoff: None,
            timer: None,
            on_terminated: None,
        }
    }

    /// 由配置创建构造器，地址在此处解析与校验。
    pub fn from_config(config: &EndpointConfig) -> Result<Self, EndpointError> {
        Ok(Self::new(config.authority.clone(), config.address_group()?))
    }

    /// 注入传输工厂。
    pub fn with_transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// 注入退避提供者。
    pub fn with_backoff(mut self, backoff: Arc<dyn BackoffProvider>) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// 注入定时器。
    pub fn with_timer(mut self, timer: Arc<dyn TimerService>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// 登记终止通知，恰好触发一次。
    pub fn on_terminated(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_terminated = Some(Box::new(hook));
        self
    }

    /// 校验协作方并构造连接管理器。
    pub fn build(self) -> Result<ConnectionManager, EndpointError> {
        let factory = self
            .factory
            .ok_or(EndpointError::MissingCollaborator {
                collaborator: "transport factory",
            })?;
        let backoff = self.backoff.ok_or(EndpointError::MissingCollaborator {
            collaborator: "backoff provider",
        })?;
        let timer = match self.timer {
            Some(timer) => timer,
            None => default_timer().ok_or(EndpointError::MissingCollaborator {
                collaborator: "timer service",
            })?,
        };

        let state = State {
            lifecycle: Lifecycle::Running,
            cycle: AddressCycle::new(self.group.clone()),
            backoff: None,
            phase: Phase::Idle,
            pending: None,
            transports: Vec::new(),
            next_attempt: 0,
            next_generation: 0,
            on_terminated: self.on_terminated,
        };
        Ok(ConnectionManager {
            inner: Arc::new(Inner {
                authority: Arc::from(self.authority),
                group: self.group,
                factory,
                backoff,
                timer,
                state: Mutex::new(state),
            }),
        })
    }
}

#[cfg(feature = "runtime-tokio")]
fn default_timer() -> Option<Arc<dyn TimerService>> {
    tokio::runtime::Handle::try_current()
        .ok()
        .map(|runtime| Arc::new(crate::TokioTimer::new(runtime)) as Arc<dyn TimerService>)
}

#[cfg(not(feature = "runtime-tokio"))]
fn default_timer() -> Option<Arc<dyn TimerService>> {
    None
}

/// 单个逻辑端点的连接管理器。
///
/// # 教案式注释
/// - **意图 (Why)**：向调用方屏蔽地址轮转、退避重连与停机排空的细节，只暴露“要一个能建流的传输”与“停机”；
/// - **契约 (What)**：
///   - 任意时刻至多一个建连尝试在进行（建连中或退避等待中）；
///   - 公开方法均不阻塞，可在任意线程并发调用；
///   - 终止通知恰好触发一次，且只会在 `shutdown` 之后发生；
/// - **风险 (Trade-offs)**：克隆只增加引用计数；生命周期监听器只持有弱引用，管理器被全部释放后迟到的事件被忽略。
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// 创建构造器。
    pub fn builder(authority: impl Into<String>, group: AddressGroup) -> ConnectionManagerBuilder {
        ConnectionManagerBuilder::new(authority, group)
    }

    /// 立即返回可用于建流的传输；已停机时返回 `None`。
    ///
    /// # 执行逻辑（How）
    /// 1. 非 `Running` 状态直接返回 `None`；
    /// 2. 存在就绪连接时返回 [`TransportSlot::Ready`]；
    /// 3. 建连或退避进行中时返回同一个延迟传输；
    /// 4. 否则以当前游标地址发起新的建连，并返回与之绑定的新延迟传输。
    pub fn obtain_active_transport(&self) -> Option<TransportSlot> {
        self.inner.obtain()
    }

    /// 请求停机，幂等。
    ///
    /// 无进行中的连接时，终止通知在本方法返回前同步触发。
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    /// 当前停机状态。
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.state.lock().lifecycle
    }

    /// 端点身份。
    pub fn authority(&self) -> &str {
        &self.inner.authority
    }

    /// 地址组。
    pub fn address_group(&self) -> &AddressGroup {
        &self.inner.group
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("authority", &self.inner.authority)
            .field("lifecycle", &self.lifecycle())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct AttemptId(u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Inner {
    authority: Arc<str>,
    group: AddressGroup,
    factory: Arc<dyn TransportFactory>,
    backoff: Arc<dyn BackoffProvider>,
    timer: Arc<dyn TimerService>,
    state: Mutex<State>,
}

struct State {
    lifecycle: Lifecycle,
    cycle: AddressCycle,
    /// `None` 表示下一次建连是新一圈的起点，需要新的退避会话。
    backoff: Option<Box<dyn BackoffSession>>,
    phase: Phase,
    pending: Option<DelayedTransport>,
    /// 已创建且尚未回报 `Terminated` 的连接。
    transports: Vec<TrackedTransport>,
    next_attempt: u64,
    next_generation: u64,
    on_terminated: Option<TerminationHook>,
}

enum Phase {
    Idle,
    Connecting(AttemptId),
    BackingOff {
        generation: u64,
        timer: TimerHandle,
        /// 等待期间是否有调用方索取过传输。
        demanded: bool,
    },
    Ready {
        attempt: AttemptId,
        transport: Arc<dyn ClientTransport>,
    },
}

struct TrackedTransport {
    attempt: AttemptId,
    address: EndpointAddress,
    transport: Arc<dyn ClientTransport>,
    state: HandleState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HandleState {
    Connecting,
    Ready,
    /// 就绪前失败，等待 `Terminated`。
    Failed,
    /// 就绪后关闭，等待 `Terminated`。
    Closing,
}

impl State {
    fn buffer(&mut self) -> DelayedTransport {
        self.pending
            .get_or_insert_with(DelayedTransport::new)
            .clone()
    }

    fn has_buffered_work(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|buffer| buffer.pending_streams() > 0)
    }

    fn is_connecting(&self, attempt: AttemptId) -> bool {
        matches!(self.phase, Phase::Connecting(current) if current == attempt)
    }

    fn is_ready(&self, attempt: AttemptId) -> bool {
        matches!(self.phase, Phase::Ready { attempt: current, .. } if current == attempt)
    }

    fn tracked_mut(&mut self, attempt: AttemptId) -> Option<&mut TrackedTransport> {
        self.transports
            .iter_mut()
            .find(|tracked| tracked.attempt == attempt)
    }
}

/// 锁外执行的副作用。
enum Effect {
    Start {
        transport: Arc<dyn ClientTransport>,
        listener: Arc<dyn TransportListener>,
    },
    Replay {
        buffer: DelayedTransport,
        transport: Arc<dyn ClientTransport>,
    },
    Shutdown(Arc<dyn ClientTransport>),
    Fail {
        buffer: DelayedTransport,
        status: Status,
    },
    Terminated(TerminationHook),
}

#[derive(Default)]
struct Effects(Vec<Effect>);

impl Effects {
    fn push(&mut self, effect: Effect) {
        self.0.push(effect);
    }

    fn run(self, authority: &str) {
        for effect in self.0 {
            match effect {
                Effect::Start {
                    transport,
                    listener,
                } => transport.start(listener),
                Effect::Replay { buffer, transport } => {
                    let replayed = buffer.resolve(Arc::clone(&transport));
                    if replayed > 0 {
                        debug!(
                            authority,
                            transport = %transport.id(),
                            replayed,
                            "replayed buffered streams onto ready transport"
                        );
                    }
                }
                Effect::Shutdown(transport) => transport.shutdown(),
                Effect::Fail { buffer, status } => {
                    let failed = buffer.fail(status.clone());
                    if failed > 0 {
                        warn!(authority, failed, %status, "failing buffered streams");
                    }
                }
                Effect::Terminated(hook) => hook(),
            }
        }
    }
}

/// 交给单次建连尝试的生命周期监听器。
struct AttemptListener {
    manager: Weak<Inner>,
    attempt: AttemptId,
}

impl TransportListener for AttemptListener {
    fn on_event(&self, event: TransportEvent) {
        if let Some(inner) = self.manager.upgrade() {
            inner.handle_event(self.attempt, event);
        }
    }
}

impl Inner {
    fn obtain(self: &Arc<Self>) -> Option<TransportSlot> {
        let mut effects = Effects::default();
        let slot = {
            let mut state = self.state.lock();
            if state.lifecycle != Lifecycle::Running {
                return None;
            }
            if let Phase::Ready { transport, .. } = &state.phase {
                return Some(TransportSlot::Ready(Arc::clone(transport)));
            }
            let buffer = state.buffer();
            if matches!(state.phase, Phase::Idle) {
                self.start_attempt(&mut state, &mut effects);
            } else if let Phase::BackingOff { demanded, .. } = &mut state.phase {
                *demanded = true;
            }
            TransportSlot::Buffered(buffer)
        };
        effects.run(&self.authority);
        Some(slot)
    }

    fn shutdown(self: &Arc<Self>) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            if state.lifecycle != Lifecycle::Running {
                debug!(authority = %self.authority, "shutdown already requested");
                return;
            }
            state.lifecycle = Lifecycle::ShuttingDown;
            info!(authority = %self.authority, "shutting down endpoint");

            let draining = state.has_buffered_work();
            let cancel_wait = match &state.phase {
                Phase::Ready { transport, .. } => {
                    effects.push(Effect::Shutdown(Arc::clone(transport)));
                    false
                }
                Phase::BackingOff { timer, .. } if !draining => {
                    timer.cancel();
                    true
                }
                _ => false,
            };
            if cancel_wait {
                state.phase = Phase::Idle;
            }
            if matches!(state.phase, Phase::Idle)
                && let Some(buffer) = state.pending.take()
            {
                effects.push(Effect::Fail {
                    buffer,
                    status: Status::unavailable(SHUTDOWN_MESSAGE),
                });
            }
            self.maybe_terminate(&mut state, &mut effects);
        }
        effects.run(&self.authority);
    }

    fn handle_event(self: &Arc<Self>, attempt: AttemptId, event: TransportEvent) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            match event {
                TransportEvent::Ready => self.on_ready(&mut state, attempt, &mut effects),
                TransportEvent::Shutdown(status) => {
                    self.on_shutdown(&mut state, attempt, &status, &mut effects)
                }
                TransportEvent::Terminated => {
                    self.on_terminated(&mut state, attempt, &mut effects)
                }
            }
            self.maybe_terminate(&mut state, &mut effects);
        }
        effects.run(&self.authority);
    }

    fn reconnect_due(self: &Arc<Self>, generation: u64) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            let demanded = match state.phase {
                Phase::BackingOff {
                    generation: current,
                    demanded,
                    ..
                } if current == generation => demanded,
                _ => {
                    debug!(authority = %self.authority, generation, "ignoring stale reconnect timer");
                    return;
                }
            };
            let running = state.lifecycle == Lifecycle::Running;
            if state.has_buffered_work() || (running && demanded) {
                self.start_attempt(&mut state, &mut effects);
            } else {
                // 无人等待：回到空闲，退避会话保留到下一次建连。
                state.phase = Phase::Idle;
                debug!(authority = %self.authority, generation, "backoff elapsed with no demand; waiting for the next caller");
                if let Some(buffer) = state.pending.take() {
                    let message = if running { IDLE_MESSAGE } else { SHUTDOWN_MESSAGE };
                    effects.push(Effect::Fail {
                        buffer,
                        status: Status::unavailable(message),
                    });
                }
                self.maybe_terminate(&mut state, &mut effects);
            }
        }
        effects.run(&self.authority);
    }

    fn start_attempt(self: &Arc<Self>, state: &mut State, effects: &mut Effects) {
        if state.backoff.is_none() {
            debug!(
                authority = %self.authority,
                head = state.cycle.head(),
                "starting a new lap with a fresh backoff session"
            );
            state.backoff = Some(self.backoff.new_session());
        }

        let attempt = AttemptId(state.next_attempt);
        state.next_attempt += 1;
        let address = state.cycle.current().clone();
        debug!(authority = %self.authority, %attempt, %address, "connecting");

        let transport = self.factory.new_transport(&address, &self.authority);
        state.transports.push(TrackedTransport {
            attempt,
            address,
            transport: Arc::clone(&transport),
            state: HandleState::Connecting,
        });
        state.phase = Phase::Connecting(attempt);

        let listener: Arc<dyn TransportListener> = Arc::new(AttemptListener {
            manager: Arc::downgrade(self),
            attempt,
        });
        effects.push(Effect::Start {
            transport,
            listener,
        });
    }

    fn on_ready(&self, state: &mut State, attempt: AttemptId, effects: &mut Effects) {
        let Some(tracked) = state.tracked_mut(attempt) else {
            debug!(authority = %self.authority, %attempt, "ready event for unknown attempt");
            return;
        };
        if tracked.state != HandleState::Connecting {
            debug!(authority = %self.authority, %attempt, state = ?tracked.state, "ignoring late ready event");
            return;
        }
        tracked.state = HandleState::Ready;
        let transport = Arc::clone(&tracked.transport);
        let address = tracked.address.clone();

        if !state.is_connecting(attempt) {
            debug!(authority = %self.authority, %attempt, "ready event for a superseded attempt");
            effects.push(Effect::Shutdown(transport));
            return;
        }

        debug!(authority = %self.authority, %attempt, %address, "transport ready");
        state.phase = Phase::Ready {
            attempt,
            transport: Arc::clone(&transport),
        };
        if let Some(buffer) = state.pending.take() {
            effects.push(Effect::Replay {
                buffer,
                transport: Arc::clone(&transport),
            });
        }
        if state.lifecycle != Lifecycle::Running {
            info!(
                authority = %self.authority,
                %attempt,
                "transport became ready after shutdown; closing it once buffered streams are handed over"
            );
            effects.push(Effect::Shutdown(transport));
        }
    }

    fn on_shutdown(
        self: &Arc<Self>,
        state: &mut State,
        attempt: AttemptId,
        status: &Status,
        effects: &mut Effects,
    ) {
        let Some(tracked) = state.tracked_mut(attempt) else {
            debug!(authority = %self.authority, %attempt, "shutdown event for unknown attempt");
            return;
        };
        match tracked.state {
            HandleState::Connecting => {
                tracked.state = HandleState::Failed;
                debug!(
                    authority = %self.authority,
                    %attempt,
                    address = %tracked.address,
                    %status,
                    "connection attempt failed"
                );
                if state.is_connecting(attempt) {
                    self.attempt_failed(state, effects);
                }
            }
            HandleState::Ready => {
                tracked.state = HandleState::Closing;
                debug!(authority = %self.authority, %attempt, %status, "ready transport closed");
                if state.is_ready(attempt) {
                    self.connection_closed(state);
                }
            }
            HandleState::Failed | HandleState::Closing => {}
        }
    }

    fn on_terminated(self: &Arc<Self>, state: &mut State, attempt: AttemptId, effects: &mut Effects) {
        let Some(index) = state
            .transports
            .iter()
            .position(|tracked| tracked.attempt == attempt)
        else {
            debug!(authority = %self.authority, %attempt, "terminated event for unknown attempt");
            return;
        };
        let tracked = state.transports.remove(index);
        debug!(authority = %self.authority, %attempt, address = %tracked.address, "transport terminated");
        match tracked.state {
            HandleState::Connecting if state.is_connecting(attempt) => {
                self.attempt_failed(state, effects)
            }
            HandleState::Ready if state.is_ready(attempt) => self.connection_closed(state),
            _ => {}
        }
    }

    /// 当前尝试在就绪前失败：推进游标，决定立即重试、退避或（停机时）放弃。
    fn attempt_failed(self: &Arc<Self>, state: &mut State, effects: &mut Effects) {
        let advance = state.cycle.advance();

        if state.lifecycle != Lifecycle::Running {
            state.phase = Phase::Idle;
            if let Some(buffer) = state.pending.take() {
                effects.push(Effect::Fail {
                    buffer,
                    status: Status::unavailable(SHUTDOWN_MESSAGE),
                });
            }
            return;
        }

        if !advance.wrapped {
            debug!(authority = %self.authority, cursor = advance.cursor, "trying next address");
            self.start_attempt(state, effects);
            return;
        }

        let session = state
            .backoff
            .get_or_insert_with(|| self.backoff.new_session());
        let delay = session.next_delay();
        debug!(
            authority = %self.authority,
            ?delay,
            "every address failed in this lap; backing off"
        );
        self.schedule_reconnect(state, delay);
    }

    /// 就绪连接结束：从成功地址的下一位重新起圈，退避会话在下一次建连时重新创建。
    fn connection_closed(&self, state: &mut State) {
        state.phase = Phase::Idle;
        state.cycle.reset_head_to_next();
        state.backoff = None;
        debug!(authority = %self.authority, head = state.cycle.head(), "next attempt starts a new lap");
    }

    fn schedule_reconnect(self: &Arc<Self>, state: &mut State, delay: Duration) {
        let generation = state.next_generation;
        state.next_generation += 1;
        let manager = Arc::downgrade(self);
        let timer = self.timer.schedule_after(
            delay,
            Box::new(move || {
                if let Some(inner) = manager.upgrade() {
                    inner.reconnect_due(generation);
                }
            }),
        );
        state.phase = Phase::BackingOff {
            generation,
            timer,
            demanded: false,
        };
    }

    fn maybe_terminate(&self, state: &mut State, effects: &mut Effects) {
        if state.lifecycle != Lifecycle::ShuttingDown
            || !matches!(state.phase, Phase::Idle)
            || !state.transports.is_empty()
        {
            return;
        }
        if let Some(buffer) = state.pending.take() {
            effects.push(Effect::Fail {
                buffer,
                status: Status::unavailable(SHUTDOWN_MESSAGE),
            });
        }
        state.lifecycle = Lifecycle::Terminated;
        info!(authority = %self.authority, "endpoint terminated");
        if let Some(hook) = state.on_terminated.take() {
            effects.push(Effect::Terminated(hook));
        }
    }
}
