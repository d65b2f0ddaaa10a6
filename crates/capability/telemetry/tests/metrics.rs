use gateway_telemetry::{
    GatewayMetrics, MetricsSnapshot, metrics, record_measurement_stored,
    record_persistence_latency_ms, record_reply_ok,
};

#[test]
fn new_metrics_start_at_zero() {
    let snapshot = GatewayMetrics::new().snapshot();
    assert_eq!(snapshot, MetricsSnapshot::default());
}

#[test]
fn recorders_advance_global_counters() {
    // 全局实例可能被同一进程内其他测试累加，只比较增量。
    let before = metrics().snapshot();
    record_reply_ok();
    record_measurement_stored();
    record_measurement_stored();
    record_persistence_latency_ms(12);
    let after = metrics().snapshot();

    assert!(after.replies_ok >= before.replies_ok + 1);
    assert!(after.measurements_stored >= before.measurements_stored + 2);
    assert!(after.persistence_latency_ms_total >= before.persistence_latency_ms_total + 12);
    assert!(after.persistence_latency_ms_count >= before.persistence_latency_ms_count + 1);
}
