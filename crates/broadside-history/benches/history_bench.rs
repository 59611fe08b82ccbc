use broadside_history::{EventMemoryManager, HistoryConfig, Recordable};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

#[derive(Debug, Clone)]
struct BenchEvent {
    id: u64,
    critical: bool,
}

impl Recordable for BenchEvent {
    fn id(&self) -> u64 {
        self.id
    }

    fn timestamp(&self) -> u64 {
        self.id
    }

    fn is_critical(&self) -> bool {
        self.critical
    }
}

fn bench_record(c: &mut Criterion) {
    let mut history = EventMemoryManager::new(HistoryConfig::default()).unwrap();
    let mut next_id = 0u64;

    c.bench_function("record_event", |b| {
        b.iter(|| {
            next_id += 1;
            history.record_event(black_box(BenchEvent {
                id: next_id,
                critical: next_id % 50 == 0,
            }));
        })
    });
}

fn bench_all_events(c: &mut Criterion) {
    let mut history = EventMemoryManager::new(HistoryConfig::default()).unwrap();
    for id in 0..5_000 {
        history.record_event(BenchEvent {
            id,
            critical: id % 20 == 0,
        });
    }

    c.bench_function("all_events_full_buffer", |b| {
        b.iter(|| black_box(history.all_events()))
    });
}

criterion_group!(benches, bench_record, bench_all_events);
criterion_main!(benches);
