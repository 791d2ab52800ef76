use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::FixedOffset;
use pizzapos_analytics::{Analytics, Metrics, PeakScope, calculate_stats};
use pizzapos_core::{InMemoryBlobStore, ManualClock, OrderId};
use pizzapos_orders::{EatType, ItemImage, NewOrder, Order, OrderItem, OrderRepository, StoreOrderRepository};
use std::sync::Arc;

const T0: i64 = 1_700_000_000_000;
const MENU: [&str; 6] = ["Margherita (M)", "Funghi (L)", "Tuna (S)", "Beef", "Nutella", "Cola"];

fn orders(n: usize) -> Vec<Order> {
    (0..n)
        .map(|i| {
            let items: Vec<OrderItem> = (0..(i % 4 + 1))
                .map(|j| {
                    let item = OrderItem::new(MENU[(i + j) % MENU.len()], 100 + (j as i64) * 25);
                    if j % 2 == 0 {
                        item.with_image(ItemImage::Path("images/pizza.png".into()))
                    } else {
                        item
                    }
                })
                .collect();
            let eat_type = if i % 3 == 0 { EatType::TakeAway } else { EatType::EatIn };
            let at = T0 - (i as i64) * 1_800_000;
            let mut order = Order::create(
                NewOrder::new(items).eat_type(eat_type),
                OrderId::new(at),
                i as u64 + 1,
                at,
                "",
            )
            .expect("bench order");
            order.mark_paid(at, None);
            order.mark_served(at + 240_000);
            order
        })
        .collect()
}

fn bench_calculate_stats(c: &mut Criterion) {
    let tz = FixedOffset::east_opt(7 * 3600).expect("offset");
    let mut group = c.benchmark_group("calculate_stats");
    for n in [100usize, 1_000, 10_000] {
        let data = orders(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| calculate_stats(black_box(data), &tz));
        });
    }
    group.finish();
}

fn bench_achievement_metrics(c: &mut Criterion) {
    let tz = FixedOffset::east_opt(7 * 3600).expect("offset");
    let data = orders(10_000);
    c.bench_function("achievement_metrics_10k", |b| {
        b.iter(|| Metrics::from_orders(black_box(&data), &tz));
    });
}

fn bench_engine_queries(c: &mut Criterion) {
    let repo = StoreOrderRepository::new(InMemoryBlobStore::new());
    repo.import_orders(orders(5_000), 5_000).expect("import");
    let analytics = Analytics::new(repo)
        .with_clock(Arc::new(ManualClock::new(T0)))
        .with_timezone(FixedOffset::east_opt(7 * 3600).expect("offset"));

    c.bench_function("monthly_stats_5k", |b| b.iter(|| analytics.monthly_stats()));
    c.bench_function("peak_hours_overall_5k", |b| b.iter(|| analytics.peak_hours(PeakScope::Overall)));
    c.bench_function("weeks_with_data_5k", |b| b.iter(|| analytics.weeks_with_data()));
}

criterion_group!(benches, bench_calculate_stats, bench_achievement_metrics, bench_engine_queries);
criterion_main!(benches);
