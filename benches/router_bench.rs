//! Benchmarks for topic matching and publish fan-out
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fieldlink::broker::{topic_matches, EventBus, Message, RouterConfig, TopicRouter};
use fieldlink::mqtt::QoS;
use std::sync::Arc;
use tokio::sync::mpsc;

fn bench_topic_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("topic_matches");

    let cases = [
        ("exact", "devices/line3/status", "devices/line3/status"),
        ("single_level", "devices/+/status", "devices/line3/status"),
        ("multi_level", "devices/#", "devices/line3/status/battery"),
        ("miss", "plant/+/status", "devices/line3/status"),
    ];

    for (name, filter, topic) in cases {
        group.bench_function(name, |b| {
            b.iter(|| topic_matches(black_box(filter), black_box(topic)))
        });
    }

    group.finish();
}

fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for sessions in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(sessions as u64));

        group.bench_function(format!("fan_out_{}", sessions), |b| {
            b.iter_custom(|iters| {
                rt.block_on(async {
                    let router = TopicRouter::new(RouterConfig::default(), Arc::new(EventBus::new(16)));

                    // Half the sessions match, the rest hold an unrelated filter
                    let mut queues = Vec::with_capacity(sessions);
                    for i in 0..sessions {
                        let (tx, rx) = mpsc::channel(iters as usize + 1);
                        let id = format!("session-{}", i);
                        router.attach(&id, tx).await;
                        let filter = if i % 2 == 0 { "devices/+" } else { "plant/#" };
                        router.subscribe(&id, filter, QoS::AtLeastOnce).await.unwrap();
                        queues.push(rx);
                    }

                    let start = std::time::Instant::now();

                    for _ in 0..iters {
                        let message = Message::new("devices/status", "online").qos(QoS::AtLeastOnce);
                        router.publish(black_box(message)).await.unwrap();
                    }

                    start.elapsed()
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_topic_matching, bench_publish);
criterion_main!(benches);
