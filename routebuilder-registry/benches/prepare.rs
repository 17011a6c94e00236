use criterion::{black_box, criterion_group, criterion_main, Criterion};
use routebuilder_context::{ModelContext, NodeCounter};
use routebuilder_core::prelude::*;
use routebuilder_registry::{add_routes_concurrently, shared, ModelRegistry, RoutesBuilder};
use std::sync::Arc;

fn build_route(ctx: &ModelContext, index: usize, steps: usize) -> RouteDefinition {
    let mut builder = RouteBuilder::from(ctx, format!("direct:bench-{index}"))
        .on_exception(["IoError"])
        .end();
    for step in 0..steps {
        builder = builder
            .choice()
            .when(ExpressionDefinition::simple(format!("${{header.n}} == {step}")))
            .to(format!("mock:when-{step}"))
            .otherwise()
            .log("otherwise")
            .end();
    }
    builder.build().unwrap()
}

fn global_configuration(ctx: &ModelContext) -> RouteConfigurationDefinition {
    RouteConfigurationBuilder::new(ctx)
        .intercept()
        .log("intercepted")
        .end()
        .on_exception(["Timeout"])
        .end()
        .on_completion()
        .log("completed")
        .end()
        .build()
        .unwrap()
}

struct BenchRoutes {
    offset: usize,
    routes: usize,
    steps: usize,
}

impl RoutesBuilder for BenchRoutes {
    fn routes(&self, ctx: &ModelContext) -> routebuilder_core::Result<Vec<RouteDefinition>> {
        Ok((0..self.routes)
            .map(|i| build_route(ctx, self.offset + i, self.steps))
            .collect())
    }
}

fn fresh_registry() -> ModelRegistry {
    let ctx = ModelContext::builder()
        .counter(Arc::new(NodeCounter::new()))
        .build();
    let mut registry = ModelRegistry::new(ctx.clone());
    registry.add_route_configuration(global_configuration(&ctx));
    registry
}

fn bench_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare");

    for &steps in &[10usize, 50] {
        group.bench_function(format!("single_route_{steps}"), |b| {
            b.iter(|| {
                let mut registry = fresh_registry();
                let route = build_route(registry.context(), 0, steps);
                black_box(registry.add_route(route).unwrap());
            });
        });
    }

    group.bench_function("batch_100_routes", |b| {
        b.iter(|| {
            let mut registry = fresh_registry();
            let routes = (0..100)
                .map(|i| build_route(registry.context(), i, 5))
                .collect();
            black_box(registry.add_routes(routes).unwrap());
        });
    });

    group.bench_function("concurrent_builders_4x25", |b| {
        b.to_async(tokio::runtime::Runtime::new().unwrap()).iter(|| async {
            let registry = shared(fresh_registry());
            let builders: Vec<Arc<dyn RoutesBuilder>> = (0..4)
                .map(|i| {
                    Arc::new(BenchRoutes {
                        offset: i * 25,
                        routes: 25,
                        steps: 5,
                    }) as Arc<dyn RoutesBuilder>
                })
                .collect();
            black_box(add_routes_concurrently(&registry, builders).await.unwrap());
        });
    });

    group.finish();
}

criterion_group!(name=benches; config=Criterion::default(); targets=bench_prepare);
criterion_main!(benches);
