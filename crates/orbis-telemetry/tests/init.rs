use orbis_telemetry::{init, LogFormat, TelemetryError};

#[test]
fn init_succeeds_once_per_process() {
    let first = init(LogFormat::Text);
    assert!(first.is_ok(), "first init failed: {first:?}");
    tracing::info!("telemetry initialised");

    assert!(matches!(
        init(LogFormat::Json),
        Err(TelemetryError::Subscriber(_))
    ));
}
