//! Lazy fact forcing across whole rule set calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;

use docket_eval::{BoxError, Context, EvalError, Facts, RuleSet, Value, ZoneTable};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Route library events to the test harness; `RUST_LOG=trace` shows forcing.
fn init_tracing() {
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn counted(
    calls: &Arc<AtomicUsize>,
    value: Value,
) -> impl FnOnce() -> Result<Value, BoxError> + Send {
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }
}

fn tiered() -> RuleSet {
    init_tracing();
    let mut b = RuleSet::builder();
    b.outcome("gold", |b| {
        b.greater_than_or_equal(1000, "balance");
    })
    .outcome("silver", |b| {
        b.greater_than_or_equal(100, "balance");
        b.assert("verified");
    })
    .outcome("bronze", |b| {
        b.less_than(100, "balance");
    })
    .fallback("unranked");
    b.build(Arc::new(ZoneTable::new())).unwrap()
}

#[test]
fn shared_key_forced_once_per_call() {
    let rules = tiered();
    let calls = Arc::new(AtomicUsize::new(0));
    let facts = Facts::new()
        .with_lazy("balance", counted(&calls, Value::from(50)))
        .with("verified", true);

    let mut ctx = Context::new(facts);
    assert_eq!(rules.call_with(&mut ctx).unwrap(), Value::from("bronze"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.forced(), 1);
}

#[test]
fn unreferenced_lazy_facts_stay_unforced() {
    let rules = tiered();
    let balance = Arc::new(AtomicUsize::new(0));
    let verified = Arc::new(AtomicUsize::new(0));
    let audit = Arc::new(AtomicUsize::new(0));
    let facts = Facts::new()
        .with_lazy("balance", counted(&balance, Value::from(5000)))
        .with_lazy("verified", counted(&verified, Value::Bool(true)))
        .with_lazy("audit_log", counted(&audit, Value::Nil));

    assert_eq!(rules.call(facts).unwrap(), Value::from("gold"));
    assert_eq!(balance.load(Ordering::SeqCst), 1);
    assert_eq!(verified.load(Ordering::SeqCst), 0);
    assert_eq!(audit.load(Ordering::SeqCst), 0);
}

#[test]
fn short_circuit_skips_later_siblings() {
    init_tracing();
    let mut b = RuleSet::builder();
    b.outcome(1, |b| {
        b.any(|b| {
            b.assert("cached");
            b.assert("remote");
        });
    });
    let rules = b.build(Arc::new(ZoneTable::new())).unwrap();

    let remote = Arc::new(AtomicUsize::new(0));
    let facts = Facts::new()
        .with("cached", true)
        .with_lazy("remote", counted(&remote, Value::Bool(true)));
    assert_eq!(rules.call(facts).unwrap(), Value::from(1));
    assert_eq!(remote.load(Ordering::SeqCst), 0);
}

#[test]
fn thunk_failure_aborts_the_call() {
    let rules = tiered();
    let facts = Facts::new().with_lazy("balance", || Err("ledger unavailable".into()));

    let err = rules.call(facts).unwrap_err();
    match err {
        EvalError::LazyFailed { key, source } => {
            assert_eq!(key, "balance");
            assert_eq!(source.to_string(), "ledger unavailable");
        }
        other => panic!("expected LazyFailed, got {:?}", other),
    }
}

#[test]
fn concurrent_calls_keep_separate_contexts() {
    let rules = tiered();
    let calls = Arc::new(AtomicUsize::new(0));

    let results: Vec<Value> = thread::scope(|s| {
        let handles: Vec<_> = (0..8i64)
            .map(|i| {
                let rules = &rules;
                let calls = &calls;
                s.spawn(move || {
                    let facts = Facts::new()
                        .with_lazy("balance", counted(calls, Value::from(i * 300)))
                        .with("verified", true);
                    rules.call(facts).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 8);
    assert_eq!(results[0], Value::from("bronze"));
    assert_eq!(results[1], Value::from("silver"));
    assert_eq!(results[3], Value::from("silver"));
    assert_eq!(results[4], Value::from("gold"));
}
