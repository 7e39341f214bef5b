//! # Example: race
//!
//! Activates and deactivates a component fed from many threads at once.
//!
//! Shows how to:
//! - Implement [`Lifecycle`] and declare dependencies with callbacks.
//! - Feed bindings and a configuration from concurrent producers.
//! - Observe transitions with [`LogWriter`] and an [`Offload`]ed async listener.
//! - Read [`Notice`]s from the component bus.
//!
//! ## Flow
//! ```text
//! 10 × dep.add(ev) ─┐
//! component.start() ├─► SerialQueue ─► Machine ─► on_add … Lifecycle::start ─► Active
//! cfg.updated(..)  ─┘                       └──► LogWriter, Offload ─► Audit.on_change()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example race --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use depvisor::{
    AsyncStateListener, CallbackError, Component, ComponentConfig, ComponentState, Configuration,
    ConfigurationDependency, Dependency, Event, Lifecycle, LogWriter, Notice, NoticeKind, Offload,
    StateChange,
};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing_subscriber::EnvFilter;

const BACKENDS: usize = 10;

#[derive(Default)]
struct Gateway {
    backends: usize,
    listen: Option<String>,
}

impl Lifecycle for Gateway {
    fn start(&mut self) -> Result<(), CallbackError> {
        tracing::info!(backends = self.backends, listen = ?self.listen, "gateway serving");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CallbackError> {
        tracing::info!("gateway draining");
        Ok(())
    }
}

/// Slow sink kept off the drain loop.
struct Audit {
    seen: AtomicUsize,
}

#[async_trait]
impl AsyncStateListener for Audit {
    async fn on_change(&self, change: &StateChange) {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let n = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        println!("[audit] #{n} {} -> {}", change.component, change.state);
    }

    fn name(&self) -> &'static str {
        "audit"
    }
}

fn describe(n: &Notice) -> String {
    format!(
        "{:?} dependency={} state={} reason={}",
        n.kind,
        n.dependency.as_deref().unwrap_or("-"),
        n.state.map(|s| s.label()).unwrap_or("-"),
        n.reason.as_deref().unwrap_or("-"),
    )
}

/// Waits until the bus reports a transition into `state`.
///
/// Returning from `add`/`start` only means the command was queued; the
/// transition itself is observed on the bus.
async fn reached(
    notices: &mut Receiver<Notice>,
    state: ComponentState,
) -> Result<(), Box<dyn std::error::Error>> {
    let wait = async {
        loop {
            match notices.recv().await {
                Ok(n) if n.kind == NoticeKind::StateChanged && n.state == Some(state) => {
                    return Ok(());
                }
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => {
                    return Err(Box::<dyn std::error::Error>::from("notice bus closed"));
                }
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait).await?
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let backends: Vec<Dependency<Gateway>> = (0..BACKENDS)
        .map(|i| {
            Dependency::builder(format!("backend-{i}"))
                .required(true)
                .on_add(|g: &mut Gateway, _| {
                    g.backends += 1;
                    Ok(())
                })
                .on_remove(|g: &mut Gateway, _| {
                    g.backends -= 1;
                    Ok(())
                })
                .build()
        })
        .collect();

    let settings = ConfigurationDependency::builder("gateway.cfg")
        .on_updated(|g: &mut Gateway, cfg: Option<&Configuration>| {
            g.listen = cfg.and_then(|c| c.get("listen")).map(str::to_string);
            Ok(())
        })
        .build();

    let audit = Offload::spawn(
        Arc::new(Audit {
            seen: AtomicUsize::new(0),
        }),
        &tokio::runtime::Handle::current(),
    );

    let mut builder = Component::builder(ComponentConfig::named("gateway"))
        .implementation(Gateway::default())
        .listener(Arc::new(LogWriter::new()))
        .listener(audit.clone());
    for dep in &backends {
        builder = builder.attach(dep);
    }
    let gateway = builder.attach(&settings).build()?;

    let mut states = gateway.subscribe();
    let mut notices = gateway.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(n) = notices.recv().await {
            println!("[notice] {}", describe(&n));
        }
    });

    // Everything at once, from blocking threads.
    let mut producers = Vec::new();
    for (i, dep) in backends.iter().cloned().enumerate() {
        producers.push(tokio::task::spawn_blocking(move || {
            dep.add(Event::new(i as u64))
        }));
    }
    {
        let gateway = gateway.clone();
        producers.push(tokio::task::spawn_blocking(move || {
            gateway.start();
            Ok(())
        }));
    }
    let cfg = settings.clone();
    let configured = tokio::task::spawn_blocking(move || {
        cfg.updated(Some(Configuration::new().with("listen", "0.0.0.0:8080")))
    });
    for p in producers {
        p.await??;
    }
    configured.await??;
    reached(&mut states, ComponentState::Active).await?;

    // And tear it down the same way.
    let mut producers = Vec::new();
    for (i, dep) in backends.iter().cloned().enumerate() {
        producers.push(tokio::task::spawn_blocking(move || {
            dep.remove(Event::new(i as u64))
        }));
    }
    {
        let gateway = gateway.clone();
        producers.push(tokio::task::spawn_blocking(move || {
            gateway.stop();
            Ok(())
        }));
    }
    for p in producers {
        p.await??;
    }
    reached(&mut states, ComponentState::Inactive).await?;
    let cfg = settings.clone();
    tokio::task::spawn_blocking(move || cfg.updated(None)).await??;
    assert_eq!(gateway.state(), ComponentState::Inactive);

    audit.shutdown().await;
    drop(gateway);
    printer.await?;
    Ok(())
}
