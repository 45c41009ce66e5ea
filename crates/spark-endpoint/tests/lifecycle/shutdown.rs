//! 停机在各阶段的排空行为与终止通知。

use spark_endpoint::Lifecycle;
use spark_transport::{ClientStream, StatusCode, StreamTransport};

use crate::support::{ClosedLog, Harness, headers, method, ms};

#[test]
fn shutdown_while_idle_terminates_immediately() {
    let h = Harness::new(1);
    h.manager.shutdown();
    assert_eq!(h.manager.lifecycle(), Lifecycle::Terminated);
    assert_eq!(h.terminations(), 1);

    assert!(h.manager.obtain_active_transport().is_none());
    h.manager.shutdown();
    assert_eq!(h.terminations(), 1);
    assert_eq!(h.factory.count(), 0);
}

#[test]
fn shutdown_during_backoff_without_pending_streams_cancels_the_reconnect() {
    let h = Harness::new(1);
    h.manager.obtain_active_transport();
    h.transport(0).fail();
    h.transport(0).terminate();
    assert_eq!(h.timer.pending_tasks(), 1);

    h.manager.shutdown();
    assert_eq!(h.timer.pending_tasks(), 0);
    assert_eq!(h.manager.lifecycle(), Lifecycle::Terminated);
    assert_eq!(h.terminations(), 1);

    h.timer.advance(ms(1_000));
    assert_eq!(h.factory.count(), 1);
    assert_eq!(h.terminations(), 1);
}

#[test]
fn shutdown_during_backoff_drains_pending_streams_through_the_scheduled_attempt() {
    let h = Harness::new(1);
    h.manager.obtain_active_transport();
    h.transport(0).fail();
    h.transport(0).terminate();

    let slot = h.manager.obtain_active_transport().expect("running");
    let log = ClosedLog::default();
    let stream = slot.new_stream(method("Drain"), headers("req-1"));
    stream.start(log.listener());

    h.manager.shutdown();
    assert_eq!(h.manager.lifecycle(), Lifecycle::ShuttingDown);
    assert!(h.manager.obtain_active_transport().is_none());
    assert_eq!(h.factory.count(), 1);
    assert_eq!(h.terminations(), 0);

    h.timer.advance(ms(10));
    assert_eq!(h.factory.count(), 2);

    let last = h.transport(1);
    last.ready();
    assert_eq!(last.stream_methods(), ["/orders.OrderService/Drain"]);
    assert_eq!(last.stream(0).ops(), ["start"]);
    assert_eq!(last.shutdown_calls(), 1);
    assert_eq!(h.terminations(), 0);

    last.close();
    assert_eq!(h.manager.lifecycle(), Lifecycle::Terminated);
    assert_eq!(h.terminations(), 1);
    assert!(log.codes().is_empty());

    h.timer.advance(ms(1_000));
    assert_eq!(h.factory.count(), 2);
}

#[test]
fn shutdown_while_connecting_hands_buffered_streams_to_the_ready_transport() {
    let h = Harness::new(2);
    let slot = h.manager.obtain_active_transport().expect("running");
    slot.new_stream(method("Get"), headers("req-1"))
        .start(ClosedLog::default().listener());

    h.manager.shutdown();
    assert_eq!(h.transport(0).shutdown_calls(), 0);

    h.transport(0).ready();
    assert_eq!(h.transport(0).stream_methods(), ["/orders.OrderService/Get"]);
    assert_eq!(h.transport(0).shutdown_calls(), 1);
    assert_eq!(h.terminations(), 0);

    h.transport(0).close();
    assert_eq!(h.terminations(), 1);
    assert_eq!(h.factory.count(), 1);
}

#[test]
fn shutdown_while_connecting_fails_buffered_streams_when_the_attempt_fails() {
    let h = Harness::new(2);
    let slot = h.manager.obtain_active_transport().expect("running");
    let log = ClosedLog::default();
    slot.new_stream(method("Get"), headers("req-1"))
        .start(log.listener());

    h.manager.shutdown();
    h.transport(0).fail();

    // 停机后不再轮转到下一个地址。
    assert_eq!(h.factory.count(), 1);
    assert_eq!(log.codes(), [StatusCode::Unavailable]);
    assert_eq!(h.terminations(), 0);

    h.transport(0).terminate();
    assert_eq!(h.manager.lifecycle(), Lifecycle::Terminated);
    assert_eq!(h.terminations(), 1);

    let late = ClosedLog::default();
    slot.new_stream(method("Late"), headers("req-2"))
        .start(late.listener());
    assert_eq!(late.codes(), [StatusCode::Unavailable]);
}

#[test]
fn shutdown_with_a_ready_transport_waits_for_its_termination() {
    let h = Harness::new(1);
    h.manager.obtain_active_transport();
    h.transport(0).ready();

    h.manager.shutdown();
    assert_eq!(h.transport(0).shutdown_calls(), 1);
    assert_eq!(h.manager.lifecycle(), Lifecycle::ShuttingDown);

    h.transport(0).fail();
    assert_eq!(h.terminations(), 0);
    h.transport(0).terminate();
    assert_eq!(h.terminations(), 1);
    assert!(h.manager.obtain_active_transport().is_none());
    assert_eq!(h.factory.count(), 1);
}

#[test]
fn failed_transports_still_pending_termination_delay_the_notification() {
    let h = Harness::new(2);
    h.manager.obtain_active_transport();
    h.transport(0).fail();
    h.transport(1).ready();

    h.manager.shutdown();
    h.transport(1).close();
    assert_eq!(h.manager.lifecycle(), Lifecycle::ShuttingDown);
    assert_eq!(h.terminations(), 0);

    h.transport(0).terminate();
    assert_eq!(h.manager.lifecycle(), Lifecycle::Terminated);
    assert_eq!(h.terminations(), 1);
}
