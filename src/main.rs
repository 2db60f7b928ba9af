use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use boleteria::actors::{CoordinatorActor, CoordinatorConfig, DeadLetterStore};
use boleteria::domain::seat_map::{SeatMapCommand, SeatMapCommandHandler, SeatMapEvent};
use boleteria::event_sourcing::MemoryEventStore;
use boleteria::messaging::{EventPublisher, InProcessBroker};
use boleteria::projections::{
    DailySalesProjection, DashboardProjection, EventPublished, ForumProjection, ProjectionRunner,
};
use boleteria::realtime::{RealtimeHub, RealtimeNotifier};
use boleteria::utils::{RetryConfig, ServiceToken, TokenCache, TokenFetcher};
use boleteria::{metrics, EngineConfig};

use actix::Actor;
use async_trait::async_trait;

// Demo wiring: in-memory store, in-process broker, every consumer in one
// process. Production wiring swaps the store for ScyllaDB (`scylla-store`)
// and the publisher for Redpanda (`redpanda`); the flow is identical.

/// Stand-in for the identity provider in the demo.
struct StaticTokenFetcher;

#[async_trait]
impl TokenFetcher for StaticTokenFetcher {
    async fn fetch(&self) -> anyhow::Result<ServiceToken> {
        Ok(ServiceToken {
            access_token: "demo-service-token".to_string(),
            expires_in: Duration::from_secs(3600),
        })
    }
}

#[actix::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,boleteria=debug")),
        )
        .init();

    tracing::info!("starting seat inventory engine demo");

    let config = EngineConfig::from_env();

    // === Storage, command handler, fabric ===
    let store = Arc::new(MemoryEventStore::<SeatMapEvent>::new(
        "SeatMap",
        &config.seat_map_topic,
    ));
    let handler = Arc::new(SeatMapCommandHandler::new(store.clone()));
    let broker = Arc::new(InProcessBroker::new());

    // === Metrics ===
    let engine_metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        metric_families = engine_metrics.registry().gather().len(),
        "metrics registry created"
    );
    let metrics_registry = Arc::new(engine_metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!(error = %e, "metrics runtime failed to start");
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!(error = %e, "metrics server error");
            }
        });
    });

    // === Projections, subscribed before anything is published ===
    let dead_letters = Arc::new(DeadLetterStore::new());
    let hub = Arc::new(RealtimeHub::new());
    let sales = Arc::new(DailySalesProjection::new());
    let dashboard = Arc::new(DashboardProjection::new());
    let tokens = Arc::new(TokenCache::new(
        Arc::new(StaticTokenFetcher),
        Duration::from_secs(30),
    ));
    let forum = Arc::new(ForumProjection::new(tokens));

    let consumers: Vec<(&str, Arc<dyn boleteria::projections::Projection>, &str)> = vec![
        ("sales", sales.clone(), config.seat_map_topic.as_str()),
        ("dashboard", dashboard.clone(), config.seat_map_topic.as_str()),
        (
            "realtime",
            Arc::new(RealtimeNotifier::new(hub.clone())),
            config.seat_map_topic.as_str(),
        ),
        ("forum", forum.clone(), config.events_topic.as_str()),
    ];

    for (group, projection, topic) in consumers {
        let subscription = broker.subscribe(topic, group);
        let runner = ProjectionRunner::new(projection, RetryConfig::default(), dead_letters.clone());
        tokio::spawn(async move { runner.run(subscription).await });
    }

    // === Supervised infrastructure: reaper, dispatcher, DLQ, health ===
    let _coordinator = CoordinatorActor::new(
        handler.clone(),
        store.clone(),
        broker.clone(),
        dead_letters.clone(),
        CoordinatorConfig {
            reaper_interval: Duration::from_secs(1),
            outbox_poll_interval: config.outbox_poll_interval,
            outbox_batch_size: config.outbox_batch_size,
            publish_retry: RetryConfig::aggressive(),
        },
    )
    .start();

    // === Build a map for tonight's concert ===
    let map_id = Uuid::new_v4();
    let concert_id = Uuid::new_v4();
    let correlation = Uuid::new_v4();

    handler
        .handle(
            map_id,
            SeatMapCommand::CreateMap {
                event_id: concert_id,
                total_capacity: 4,
            },
            correlation,
        )
        .await?;
    handler
        .handle(
            map_id,
            SeatMapCommand::AddCategory {
                name: "VIP".to_string(),
                base_price: 150.0,
                is_premium: true,
            },
            correlation,
        )
        .await?;
    handler
        .handle(
            map_id,
            SeatMapCommand::AddCategory {
                name: "General".to_string(),
                base_price: 40.0,
                is_premium: false,
            },
            correlation,
        )
        .await?;
    for (row, number, category) in [("A", 1, "VIP"), ("A", 2, "VIP"), ("B", 1, "General"), ("B", 2, "General")] {
        handler
            .handle(
                map_id,
                SeatMapCommand::AddSeat {
                    row: row.to_string(),
                    number,
                    category: category.to_string(),
                },
                correlation,
            )
            .await?;
    }
    tracing::info!(map_id = %map_id, "seat map built");

    // A viewer watching the seat picker for this concert.
    let viewer_id = Uuid::new_v4();
    let mut viewer = hub.join_event(concert_id, viewer_id);

    // === Two buyers race for A-1 ===
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    handler
        .handle(
            map_id,
            SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: user_a,
                ttl_seconds: 2,
            },
            Uuid::new_v4(),
        )
        .await?;
    engine_metrics.record_reservation(true);
    tracing::info!(user = %user_a, "user A holds A-1 (ttl 2s)");

    let conflict = handler
        .handle(
            map_id,
            SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: user_b,
                ttl_seconds: 2,
            },
            Uuid::new_v4(),
        )
        .await;
    engine_metrics.record_reservation(false);
    tracing::info!(result = %conflict.unwrap_err(), "user B lost the race for A-1");

    // === User B buys A-2 instead ===
    handler
        .handle(
            map_id,
            SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 2,
                holder_id: user_b,
                ttl_seconds: config.default_hold_ttl_seconds,
            },
            Uuid::new_v4(),
        )
        .await?;
    engine_metrics.record_reservation(true);
    handler
        .handle(
            map_id,
            SeatMapCommand::ConfirmSale {
                row: "A".to_string(),
                number: 2,
                holder_id: user_b,
            },
            Uuid::new_v4(),
        )
        .await?;
    tracing::info!(user = %user_b, "user B bought A-2");

    // === The events context announces the concert (twice; the forum
    // projection must create exactly one forum) ===
    let published = serde_json::to_string(&EventPublished {
        evento_id: concert_id,
        name: "Concierto de Rock".to_string(),
        event_date: chrono::Utc::now() + chrono::Duration::days(30),
    })?;
    broker
        .publish(&config.events_topic, &concert_id.to_string(), &published)
        .await?;
    broker
        .publish(&config.events_topic, &concert_id.to_string(), &published)
        .await?;

    // === Let A-1's hold expire; the reaper returns it to the pool ===
    tracing::info!("waiting for A-1's hold to expire and the reaper to sweep");
    tokio::time::sleep(Duration::from_secs(4)).await;

    handler
        .handle(
            map_id,
            SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: user_b,
                ttl_seconds: config.default_hold_ttl_seconds,
            },
            Uuid::new_v4(),
        )
        .await?;
    engine_metrics.record_reservation(true);
    tracing::info!(user = %user_b, "user B now holds the reclaimed A-1");

    // Give the dispatcher and consumers a moment to drain.
    tokio::time::sleep(Duration::from_secs(2)).await;

    // === Read models ===
    let today = chrono::Utc::now().date_naive();
    if let Some(totals) = sales.totals_for(today) {
        tracing::info!(
            tickets_sold = totals.tickets_sold,
            total_amount = totals.total_amount,
            "daily sales totals"
        );
    }
    if let Some(counts) = dashboard.counts_for(concert_id) {
        tracing::info!(
            available = counts.available,
            held = counts.held,
            sold = counts.sold,
            "dashboard seat counts"
        );
    }
    tracing::info!(forums = forum.forum_count(), "forum records (expected 1)");

    let mut pushes = 0;
    while let Ok(push) = viewer.try_recv() {
        pushes += 1;
        engine_metrics.record_push(match push {
            boleteria::realtime::PushMessage::SeatReserved { .. } => "AsientoReservado",
            boleteria::realtime::PushMessage::SeatReleased { .. } => "AsientoLiberado",
            boleteria::realtime::PushMessage::Notification { .. } => "RecibirNotificacion",
        });
    }
    tracing::info!(pushes = pushes, "pushes delivered to the demo viewer");

    engine_metrics.set_outbox_pending(0);
    tracing::info!(
        dead_letters = dead_letters.len(),
        "demo complete"
    );

    Ok(())
}
