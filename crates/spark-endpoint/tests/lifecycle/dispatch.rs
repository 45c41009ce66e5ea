//! `obtain_active_transport` 的返回种类、缓冲重放与过期事件。

use bytes::Bytes;
use spark_transport::{ClientStream, StatusCode, StreamTransport};

use crate::support::{ClosedLog, Harness, RecordingFactory, headers, method, ms};

#[test]
fn obtain_never_waits_for_a_connection() {
    let h = Harness::new(1);

    let first = h.manager.obtain_active_transport().expect("running");
    assert!(first.delayed().is_some());

    h.transport(0).fail();
    let backing_off = h.manager.obtain_active_transport().expect("running");
    assert!(backing_off.delayed().is_some());

    h.timer.advance(ms(10));
    let connecting = h.manager.obtain_active_transport().expect("running");
    assert!(connecting.delayed().is_some());

    h.transport(1).ready();
    let ready = h.manager.obtain_active_transport().expect("running");
    assert!(ready.is_ready());
    assert_eq!(
        ready.ready_transport().map(|transport| transport.id().into_owned()),
        Some("recording-1".to_owned())
    );
}

#[test]
fn one_buffer_spans_the_whole_attempt_including_backoff() {
    let h = Harness::new(1);
    let first = h.manager.obtain_active_transport().expect("running");
    h.transport(0).fail();
    let second = h.manager.obtain_active_transport().expect("running");
    h.timer.advance(ms(10));
    let third = h.manager.obtain_active_transport().expect("running");

    let first = first.delayed().expect("buffered");
    assert!(first.same_buffer(second.delayed().expect("buffered")));
    assert!(first.same_buffer(third.delayed().expect("buffered")));
    assert!(!first.is_resolved());
}

#[test]
fn buffered_streams_replay_in_submission_order_once_ready() {
    let h = Harness::new(2);
    let slot = h.manager.obtain_active_transport().expect("running");
    let log = ClosedLog::default();

    let create = slot.new_stream(method("Create"), headers("req-1"));
    create.start(log.listener());
    create.write_message(Bytes::from_static(b"order-42"));
    create.half_close();
    let list = slot.new_stream(method("List"), headers("req-2"));
    list.start(log.listener());
    let abandoned = slot.new_stream(method("Abandoned"), headers("req-3"));
    abandoned.start(log.listener());
    abandoned.cancel(spark_transport::Status::cancelled("caller gave up"));
    assert_eq!(slot.delayed().expect("buffered").pending_streams(), 2);

    // 缓冲区跨越失败的尝试，最终交给成功的连接。
    h.transport(0).fail();
    assert!(h.transport(0).stream_methods().is_empty());
    h.transport(1).ready();

    let ready = h.transport(1);
    assert_eq!(
        ready.stream_methods(),
        [
            "/orders.OrderService/Create",
            "/orders.OrderService/List"
        ]
    );
    assert_eq!(
        ready.stream(0).ops(),
        ["start", "message:order-42", "half_close"]
    );
    assert_eq!(ready.stream(1).ops(), ["start"]);
    assert_eq!(
        ready.stream_headers(1).get("x-request-id").map(|value| &value[..]),
        Some(&b"req-2"[..])
    );
    assert_eq!(log.codes(), [StatusCode::Cancelled]);

    // 已解析的缓冲区直接透传后续请求。
    slot.new_stream(method("Late"), headers("req-4"));
    assert_eq!(ready.stream_methods().len(), 3);
}

#[test]
fn synchronous_ready_during_start_does_not_deadlock() {
    let h = Harness::with_factory(1, RecordingFactory::auto_ready());

    let slot = h.manager.obtain_active_transport().expect("running");
    let delayed = slot.delayed().expect("kind decided before the attempt started");
    assert!(delayed.is_resolved());

    slot.new_stream(method("Get"), headers("req-1"));
    assert_eq!(h.transport(0).stream_methods(), ["/orders.OrderService/Get"]);
    assert!(h.manager.obtain_active_transport().expect("running").is_ready());
}

#[test]
fn late_events_from_superseded_attempts_are_ignored() {
    let h = Harness::new(2);
    h.manager.obtain_active_transport();
    h.transport(0).fail();
    assert_eq!(h.factory.count(), 2);

    // 失败后才到达的就绪与重复的关闭都不影响当前尝试。
    h.transport(0).ready();
    h.transport(0).fail();
    assert!(!h.manager.obtain_active_transport().expect("running").is_ready());
    assert_eq!(h.factory.count(), 2);
    assert_eq!(h.timer.pending_tasks(), 0);

    h.transport(0).terminate();
    h.transport(0).terminate();
    assert_eq!(h.factory.count(), 2);

    h.transport(1).ready();
    assert!(h.manager.obtain_active_transport().expect("running").is_ready());
}

#[test]
fn termination_without_shutdown_is_treated_as_failure() {
    let h = Harness::new(1);
    h.manager.obtain_active_transport();
    h.transport(0).terminate();
    assert_eq!(h.backoff.consulted(0), 1);
    h.manager.obtain_active_transport();
    h.timer.advance(ms(10));
    assert_eq!(h.factory.count(), 2);

    // 就绪连接直接终止等同于连接结束：回到空闲，等待下一次调用。
    h.transport(1).ready();
    h.transport(1).terminate();
    let slot = h.manager.obtain_active_transport().expect("running");
    assert!(!slot.is_ready());
    assert_eq!(h.factory.count(), 3);
    assert_eq!(h.backoff.sessions_created(), 2);
}
