use std::borrow::Cow;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Level;
use tracing_sampler::infrastructure::mocks::{MockScheduler, RecordingFacility};
use tracing_sampler::{
    CounterKind, Entry, Facility, Fields, Sampler, SamplerConfig, SamplingDecision,
};

fn build(
    first: u64,
    thereafter: u64,
    kind: CounterKind,
) -> (Sampler<RecordingFacility>, RecordingFacility, Arc<MockScheduler>) {
    let facility = RecordingFacility::new();
    let scheduler = Arc::new(MockScheduler::new());
    let sampler = Sampler::builder(facility.clone())
        .with_tick(Duration::from_secs(1))
        .with_first(first)
        .with_thereafter(thereafter)
        .with_counter(kind)
        .with_scheduler(scheduler.clone())
        .build()
        .unwrap();
    (sampler, facility, scheduler)
}

fn hits(sampler: &Sampler<RecordingFacility>, message: &'static str, times: usize) -> Vec<usize> {
    (1..=times)
        .filter(|_| {
            !sampler
                .check(&Entry::new(Level::INFO, message), Vec::new())
                .is_empty()
        })
        .collect()
}

const KINDS: [CounterKind; 2] = [CounterKind::Sharded, CounterKind::Exact];

#[test]
fn test_scenario_a_burst_of_one_then_every_third() {
    for kind in KINDS {
        let (sampler, facility, _) = build(1, 3, kind);
        assert_eq!(hits(&sampler, "foo", 10), vec![1, 4, 7, 10], "{:?}", kind);
        assert_eq!(facility.count(), 4);
    }
}

#[test]
fn test_scenario_b_no_throttling() {
    for kind in KINDS {
        let (sampler, facility, scheduler) = build(0, 1, kind);
        assert_eq!(hits(&sampler, "foo", 25).len(), 25);
        assert_eq!(facility.count(), 25);
        // Crossing the zero allowance still arms one reset.
        assert_eq!(scheduler.pending(), 1);
    }
}

#[test]
fn test_scenario_c_disabled_level_leaves_counter_untouched() {
    for kind in KINDS {
        let (sampler, facility, scheduler) = build(1, 3, kind);
        facility.set_max_level(Level::ERROR);

        assert!(hits(&sampler, "foo", 10).is_empty());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(sampler.metrics().snapshot().total_entries(), 0);

        facility.set_max_level(Level::INFO);
        assert_eq!(hits(&sampler, "foo", 10), vec![1, 4, 7, 10]);
    }
}

#[test]
fn test_scenario_d_reset_after_tick_restarts_burst() {
    for kind in KINDS {
        let (sampler, _, scheduler) = build(1, 3, kind);

        // Hit 1 forwards, hit 2 crosses the allowance and arms the reset.
        assert_eq!(hits(&sampler, "foo", 2), vec![1]);
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.advance(Duration::from_millis(999)), 0);
        assert_eq!(hits(&sampler, "foo", 1), Vec::<usize>::new());

        assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);

        // Count restarted: the same pattern as a fresh key.
        assert_eq!(hits(&sampler, "foo", 10), vec![1, 4, 7, 10]);
    }
}

#[test]
fn test_forward_rule_for_every_hit() {
    for (first, thereafter) in [(0, 1), (0, 4), (3, 1), (5, 2), (10, 7)] {
        let (sampler, _, _) = build(first, thereafter, CounterKind::Exact);
        let forwarded = hits(&sampler, "rule", 60);
        let expected: Vec<usize> = (1..=60u64)
            .filter(|&n| n <= first || (n - first) % thereafter == 0)
            .map(|n| n as usize)
            .collect();
        assert_eq!(forwarded, expected, "first={} thereafter={}", first, thereafter);
    }
}

#[test]
fn test_with_siblings_share_one_counter() {
    for kind in KINDS {
        let (sampler, facility, _) = build(1, 3, kind);

        let mut a_fields = Fields::new();
        a_fields.insert(Cow::Borrowed("handler"), Cow::Borrowed("a"));
        let mut b_fields = Fields::new();
        b_fields.insert(Cow::Borrowed("handler"), Cow::Borrowed("b"));

        let a = sampler.with(&a_fields);
        let b = sampler.with(&b_fields);

        let entry = Entry::new(Level::INFO, "foo");
        let mut written = Vec::new();
        for i in 0..10 {
            let sibling = if i % 2 == 0 { &a } else { &b };
            written = sibling.check(&entry, written);
        }

        // Ten hits on one shared count: 1, 4, 7, 10 forward.
        assert_eq!(written.len(), 4);
        let handlers: Vec<&str> = written
            .iter()
            .map(|r| r.fields.get("handler").map(|v| v.as_ref()).unwrap_or(""))
            .collect();
        assert_eq!(handlers, vec!["a", "b", "a", "b"]);
        assert_eq!(facility.count(), 4);
    }
}

#[test]
fn test_distinct_messages_sampled_independently() {
    let (sampler, _, scheduler) = build(2, 100, CounterKind::Exact);
    assert_eq!(hits(&sampler, "disk full", 5), vec![1, 2]);
    assert_eq!(hits(&sampler, "connection reset", 5), vec![1, 2]);
    assert_eq!(scheduler.pending(), 2);
}

#[test]
fn test_sharded_collisions_are_shared() {
    // These two keys agree on their last eight bytes and land in one slot.
    let (sharded, _, _) = build(1, 100, CounterKind::Sharded);
    assert_eq!(hits(&sharded, "xxxxxxxx-timeout", 1), vec![1]);
    assert!(hits(&sharded, "yyyyyyyy-timeout", 1).is_empty());

    let (exact, _, _) = build(1, 100, CounterKind::Exact);
    assert_eq!(hits(&exact, "xxxxxxxx-timeout", 1), vec![1]);
    assert_eq!(hits(&exact, "yyyyyyyy-timeout", 1), vec![1]);
}

#[test]
fn test_empty_message() {
    let (sampler, _, _) = build(1, 2, CounterKind::Sharded);
    assert_eq!(hits(&sampler, "", 5), vec![1, 3, 5]);
}

#[test]
fn test_pending_reset_survives_sampler_drop() {
    let (sampler, facility, scheduler) = build(1, 100, CounterKind::Exact);
    hits(&sampler, "foo", 3);
    let core = Arc::clone(sampler.core());
    drop(sampler);

    assert_eq!(scheduler.advance(Duration::from_secs(1)), 1);

    let revived = Sampler::from_core(facility, core);
    assert!(!revived
        .check(&Entry::new(Level::INFO, "foo"), Vec::new())
        .is_empty());
}

#[test]
fn test_hook_and_metrics_agree() {
    let decisions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&decisions);

    let sampler = Sampler::builder(RecordingFacility::new())
        .with_config(SamplerConfig {
            first: 2,
            thereafter: 4,
            ..SamplerConfig::default()
        })
        .with_scheduler(Arc::new(MockScheduler::new()))
        .with_hook(Arc::new(move |_: &Entry, decision: SamplingDecision| {
            sink.lock().unwrap().push(decision);
        }))
        .build()
        .unwrap();

    for _ in 0..14 {
        sampler.check(&Entry::new(Level::WARN, "slow query"), Vec::new());
    }

    let decisions = decisions.lock().unwrap();
    let forwarded = decisions.iter().filter(|d| d.is_forward()).count() as u64;
    let dropped = decisions.iter().filter(|d| d.is_drop()).count() as u64;

    let snapshot = sampler.metrics().snapshot();
    assert_eq!(snapshot.entries_forwarded, forwarded);
    assert_eq!(snapshot.entries_dropped, dropped);
    // 1, 2, then 6, 10, 14
    assert_eq!(forwarded, 5);
    assert_eq!(snapshot.resets_armed, 1);
}
