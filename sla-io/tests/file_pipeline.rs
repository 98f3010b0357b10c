use sla_core::{Error, Executor, WindowSize};
use sla_io::{FileSink, FileSource, MemorySink, StringSource};
use sla_ops::MovingAverage;

const EVENTS: &str = r#"{"timestamp": "2018-12-26 18:11:08.509654","translation_id": "5aa5b2f39f7254a75aa5","source_language": "en","target_language": "fr","client_name": "airliberty","event_name": "translation_delivered","nr_words": 30, "duration": 20}
{"timestamp": "2018-12-26 18:12:19.903159","translation_id": "5aa5b2f39f7254a75aa4","source_language": "en","target_language": "fr","client_name": "airliberty","event_name": "translation_delivered","nr_words": 30, "duration": 31}
"#;

const EXPECTED: &str = r#"{"date": "2018-12-26 18:11:00", "average_delivery_time": 20}
{"date": "2018-12-26 18:12:00", "average_delivery_time": 25.5}
{"date": "2018-12-26 18:13:00", "average_delivery_time": 25.5}"#;

#[tokio::test]
async fn file_to_file_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("events.jsonl");
    let output = dir.path().join("output");
    tokio::fs::write(&input, EVENTS).await.unwrap();

    let mut exec = Executor::new();
    exec.source(FileSource::new(&input))
        .operator(MovingAverage::new(WindowSize::default()))
        .sink(FileSink::file(&output));
    exec.run().await.unwrap();

    let written = tokio::fs::read_to_string(&output).await.unwrap();
    assert_eq!(written, EXPECTED);
}

#[tokio::test]
async fn file_sink_truncates_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("output");
    tokio::fs::write(&output, "stale content that is much longer than the new one")
        .await
        .unwrap();

    let mut exec = Executor::new();
    exec.source(StringSource(EVENTS.to_string()))
        .operator(MovingAverage::new(WindowSize::default()))
        .sink(FileSink::file(&output));
    exec.run().await.unwrap();

    assert_eq!(tokio::fs::read_to_string(&output).await.unwrap(), EXPECTED);
}

#[tokio::test]
async fn no_events_leaves_sink_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("output");
    let sink = MemorySink::new();

    let mut exec = Executor::new();
    exec.source(StringSource(String::new()))
        .operator(MovingAverage::new(WindowSize::default()))
        .sink(sink.clone());
    assert!(matches!(exec.run().await, Err(Error::NoEvents)));
    assert!(sink.outputs().is_empty());
    assert!(!output.exists());
}
