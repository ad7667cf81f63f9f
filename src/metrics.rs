// Prometheus metrics for the creature AI engine.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Rooms with a registered AI.
    pub static ref ACTIVE_ROOMS: IntGauge =
        IntGauge::new("delve_active_rooms", "Rooms with a registered AI").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total room ticks processed.
    pub static ref ROOM_TICKS_TOTAL: IntCounter =
        IntCounter::new("delve_room_ticks_total", "Total room ticks processed").unwrap();

    /// Creature actions taken, by action (walk, attack, die).
    pub static ref NPC_ACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("delve_npc_actions_total", "Creature actions taken"),
        &["action"],
    )
    .unwrap();

    /// Attack resolutions, by outcome (miss, block, parry, hit).
    pub static ref ATTACK_OUTCOMES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("delve_attack_outcomes_total", "Attack resolutions by outcome"),
        &["outcome"],
    )
    .unwrap();

    /// Creature deaths, by cause (effects, combat, counter).
    pub static ref CREATURE_DEATHS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("delve_creature_deaths_total", "Creature deaths by cause"),
        &["cause"],
    )
    .unwrap();

    /// Creature turns that errored or panicked and were skipped.
    pub static ref TURN_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "delve_turn_failures_total",
        "Creature turns that failed and were isolated",
    )
    .unwrap();

    /// Path queries that found no route.
    pub static ref UNREACHABLE_PATHS: IntCounter = IntCounter::new(
        "delve_unreachable_paths_total",
        "Path queries that found no route",
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Per-room tick processing time in milliseconds.
    pub static ref ROOM_TICK_DURATION_MS: Histogram = Histogram::with_opts(
        HistogramOpts::new("delve_room_tick_duration_ms", "Per-room tick processing time in ms")
            .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0]),
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ACTIVE_ROOMS.clone()),
        Box::new(ROOM_TICKS_TOTAL.clone()),
        Box::new(NPC_ACTIONS_TOTAL.clone()),
        Box::new(ATTACK_OUTCOMES_TOTAL.clone()),
        Box::new(CREATURE_DEATHS_TOTAL.clone()),
        Box::new(TURN_FAILURES_TOTAL.clone()),
        Box::new(UNREACHABLE_PATHS.clone()),
        Box::new(ROOM_TICK_DURATION_MS.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("Metric registration skipped: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
