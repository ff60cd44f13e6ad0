use commander::{
    AggregateRef, BoxError, Command, CommandContext, CommandRegistry, Commander, Event,
    EventRecord, EventRegistry,
};
use criterion::{Criterion, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use serde_json::json;
use store::{AggregateId, InMemoryStore, StoredAggregate};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Gauge {
    id: AggregateId,
    level: i64,
    #[serde(skip)]
    version: u64,
}

impl StoredAggregate for Gauge {
    fn aggregate_type() -> &'static str {
        "Gauge"
    }

    fn aggregate_id(&self) -> AggregateId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[derive(Debug, Deserialize)]
struct Raise {
    steps: i64,
}

impl Command<Gauge> for Raise {
    fn is_valid(&self) -> bool {
        self.steps > 0
    }

    fn execute(
        &self,
        aggregate: &AggregateRef<Gauge>,
        _context: &CommandContext,
    ) -> Result<Vec<EventRecord<Gauge>>, BoxError> {
        Ok((0..self.steps)
            .map(|_| EventRecord::new(aggregate, "gauge/raised", json!({"by": 1})))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct Raised {
    by: i64,
}

impl Event<Gauge> for Raised {
    fn is_valid(&self) -> bool {
        true
    }

    fn apply(&self, record: &EventRecord<Gauge>) {
        record.aggregate().update(|gauge| gauge.level += self.by);
    }
}

type GaugeCommander = Commander<
    EventRegistry<Gauge>,
    CommandRegistry<Gauge>,
    InMemoryStore,
    InMemoryStore,
    InMemoryStore,
>;

fn make_commander(store: &InMemoryStore) -> GaugeCommander {
    let mut events = EventRegistry::new();
    events.register::<Raised>("gauge/raised").unwrap();
    let mut commands = CommandRegistry::new();
    commands.register::<Raise>("gauge/raise").unwrap();
    Commander::new(events, commands, store.clone(), store.clone(), store.clone())
}

fn gauge() -> AggregateRef<Gauge> {
    AggregateRef::new(Gauge {
        id: AggregateId::new(),
        level: 0,
        version: 0,
    })
}

fn bench_execute_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let commander = make_commander(&store);
    let target = gauge();

    c.bench_function("commander/execute_single_event", |b| {
        b.to_async(&rt).iter(|| async {
            commander
                .execute(&target, "gauge/raise", json!({"steps": 1}))
                .await
                .unwrap();
        });
    });
}

fn bench_execute_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("commander/execute_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let commander = make_commander(&store);
                let target = gauge();
                commander
                    .execute(&target, "gauge/raise", json!({"steps": 10}))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_load_aggregate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let commander = make_commander(&store);
    let target = gauge();
    let id = target.read().id;

    // Pre-populate with 100 commits
    rt.block_on(async {
        for _ in 0..100 {
            commander
                .execute(&target, "gauge/raise", json!({"steps": 1}))
                .await
                .unwrap();
        }
    });

    c.bench_function("store/load_aggregate", |b| {
        b.iter(|| store.load::<Gauge>(id).unwrap());
    });

    c.bench_function("store/records_for_100", |b| {
        b.iter(|| store.records_for(id));
    });
}

criterion_group!(
    benches,
    bench_execute_single_event,
    bench_execute_batch_10,
    bench_load_aggregate
);
criterion_main!(benches);
