use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static EVENTS_PARSED: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new("sla_events_parsed_total", "Delivery events decoded from the input")
        .unwrap();
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

pub static BUCKETS: Lazy<IntGauge> = Lazy::new(|| {
    let g = IntGauge::new("sla_minute_buckets", "Minutes holding at least one event in the last run")
        .unwrap();
    REGISTRY.register(Box::new(g.clone())).unwrap();
    g
});

pub static MINUTES_EMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new("sla_minutes_emitted_total", "Output minutes produced"),
        &["average"],
    )
    .unwrap();
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

pub static BYTES_WRITTEN: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new("sla_bytes_written_total", "Total bytes written by sink"),
        &["sink"],
    )
    .unwrap();
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

pub static EVENT_DURATION: Lazy<Histogram> = Lazy::new(|| {
    let h = Histogram::with_opts(
        HistogramOpts::new("sla_event_duration", "Delivery duration of decoded events").buckets(
            vec![1.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0],
        ),
    )
    .unwrap();
    REGISTRY.register(Box::new(h.clone())).unwrap();
    h
});

pub fn render_prometheus() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer).ok();
    String::from_utf8(buffer).unwrap_or_default()
}
