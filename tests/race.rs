//! Concurrent activation and deactivation under arbitrary producer interleavings.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use common::{Counters, Fixture};
use depvisor::{Component, ComponentState, Configuration, ConfigurationError};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

const N: usize = 10;

type Pending = Arc<Mutex<Vec<JoinHandle<Result<(), ConfigurationError>>>>>;

/// Registers a listener that, on `WaitingForRequired`, delivers the
/// configuration from another worker.
fn configure_when_waiting(fx: &Fixture) -> Pending {
    let pending: Pending = Arc::new(Mutex::new(Vec::new()));
    let fired = AtomicBool::new(false);
    let config = fx.config.clone();
    let handle = Handle::current();
    let sink = Arc::clone(&pending);

    fx.component.add_state_listener(Arc::new(
        move |_: &Component<common::Recorder>, state: ComponentState| {
            if state == ComponentState::WaitingForRequired && !fired.swap(true, Ordering::SeqCst) {
                let config = config.clone();
                let job = handle.spawn_blocking(move || {
                    config.updated(Some(Configuration::new().with("foo", "bar")))
                });
                sink.lock().push(job);
            }
        },
    ));
    pending
}

async fn activate(fx: &Fixture) {
    let pending = configure_when_waiting(fx);

    // 10 adds + start released together; the configuration arrives from a
    // 12th worker spawned by the listener; a 13th checks snapshots meanwhile.
    let barrier = Arc::new(Barrier::new(N + 1));
    let mut producers = Vec::with_capacity(N + 1);
    for i in 0..N {
        let (dep, barrier) = (fx.deps[i].clone(), Arc::clone(&barrier));
        producers.push(tokio::task::spawn_blocking(move || {
            barrier.wait();
            dep.add(Fixture::event(i)).expect("attached");
        }));
    }
    {
        let (component, barrier) = (fx.component.clone(), Arc::clone(&barrier));
        producers.push(tokio::task::spawn_blocking(move || {
            barrier.wait();
            component.start();
        }));
    }

    let stop_monitor = Arc::new(AtomicBool::new(false));
    let monitor = {
        let (component, deps, stop) =
            (fx.component.clone(), fx.deps.clone(), Arc::clone(&stop_monitor));
        tokio::task::spawn_blocking(move || {
            while !stop.load(Ordering::SeqCst) {
                if component.state() == ComponentState::Active {
                    assert!(
                        deps.iter().all(|d| d.is_available()),
                        "active with a required dependency unavailable"
                    );
                }
                std::thread::yield_now();
            }
        })
    };

    for p in producers {
        p.await.expect("producer");
    }

    let counters = Arc::clone(&fx.counters);
    fx.counters
        .wait_until("activation", || {
            Counters::get(&counters.starts) == 1
                && fx.component.state() == ComponentState::Active
                && fx.bound_dependency_count() == N
                && fx.config.configuration().is_some()
        })
        .await;

    stop_monitor.store(true, Ordering::SeqCst);
    monitor.await.expect("snapshot invariant");

    let jobs: Vec<_> = pending.lock().drain(..).collect();
    assert_eq!(jobs.len(), 1, "configuration delivered exactly once");
    for job in jobs {
        assert_eq!(job.await.expect("updated worker"), Ok(()));
    }

    assert_eq!(Counters::get(&counters.adds), N);
    assert_eq!(Counters::get(&counters.cfg_binds), 1);
    assert_eq!(
        fx.config.configuration().unwrap().get("foo"),
        Some("bar")
    );
}

async fn deactivate(fx: &Fixture) {
    let barrier = Arc::new(Barrier::new(N + 2));
    let mut producers = Vec::with_capacity(N + 2);
    for i in 0..N {
        let (dep, barrier) = (fx.deps[i].clone(), Arc::clone(&barrier));
        producers.push(tokio::task::spawn_blocking(move || {
            barrier.wait();
            dep.remove(Fixture::event(i)).expect("attached");
        }));
    }
    {
        let (component, barrier) = (fx.component.clone(), Arc::clone(&barrier));
        producers.push(tokio::task::spawn_blocking(move || {
            barrier.wait();
            component.stop();
        }));
    }
    {
        let (config, barrier) = (fx.config.clone(), Arc::clone(&barrier));
        producers.push(tokio::task::spawn_blocking(move || {
            barrier.wait();
            assert_eq!(config.updated(None), Ok(()));
        }));
    }
    for p in producers {
        p.await.expect("producer");
    }

    let counters = Arc::clone(&fx.counters);
    fx.counters
        .wait_until("deactivation", || {
            Counters::get(&counters.removes) == N
                && Counters::get(&counters.cfg_unbinds) == 1
                && fx.component.state() == ComponentState::Inactive
                && fx.bound_dependency_count() == 0
                && fx.config.configuration().is_none()
        })
        .await;

    assert_eq!(Counters::get(&counters.stops), 1);
    assert_eq!(Counters::get(&counters.destroys), 1);
    assert_eq!(fx.component.pending(), 0);
}

async fn cycle() {
    let fx = Fixture::new(N);
    activate(&fx).await;
    deactivate(&fx).await;
    fx.counters.assert_clean();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 13)]
async fn test_concurrent_activation_is_exactly_once() {
    let fx = Fixture::new(N);
    activate(&fx).await;
    fx.counters.assert_clean();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 13)]
async fn test_concurrent_shutdown_is_exactly_once() {
    let fx = Fixture::new(N);
    activate(&fx).await;
    deactivate(&fx).await;
    fx.counters.assert_clean();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 13)]
async fn test_repeated_cycles_leave_no_stale_state() {
    for _ in 0..2_000 {
        cycle().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 13)]
#[ignore = "stress: 10 000 full cycles"]
async fn test_stress_ten_thousand_cycles() {
    for _ in 0..10_000 {
        cycle().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 13)]
async fn test_remove_of_unbound_event_is_noop() {
    let fx = Fixture::new(N);
    let producers: Vec<_> = (0..N)
        .map(|i| {
            let dep = fx.deps[i].clone();
            tokio::task::spawn_blocking(move || dep.remove(Fixture::event(i)))
        })
        .collect();
    for p in producers {
        assert_eq!(p.await.expect("producer"), Ok(()));
    }
    assert_eq!(Counters::get(&fx.counters.removes), 0);
    assert_eq!(fx.bound_dependency_count(), 0);
    fx.counters.assert_clean();
}
