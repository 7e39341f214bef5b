#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use depvisor::{
    CallbackError, Component, ComponentConfig, ComponentState, Configuration,
    ConfigurationDependency, Dependency, Event, Lifecycle,
};
use parking_lot::Mutex;
use tokio::sync::watch;

/// Upper bound for any wait in the integration suite.
pub const BOUND: Duration = Duration::from_secs(5);

/// Callback counters shared between a [`Recorder`] and the test body.
pub struct Counters {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub destroys: AtomicUsize,
    pub adds: AtomicUsize,
    pub removes: AtomicUsize,
    pub cfg_binds: AtomicUsize,
    pub cfg_unbinds: AtomicUsize,
    pub violations: Mutex<Vec<String>>,
    step: watch::Sender<u64>,
}

impl Counters {
    pub fn new() -> Arc<Self> {
        let (step, _) = watch::channel(0);
        Arc::new(Self {
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            adds: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
            cfg_binds: AtomicUsize::new(0),
            cfg_unbinds: AtomicUsize::new(0),
            violations: Mutex::new(Vec::new()),
            step,
        })
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn hit(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.bump();
    }

    pub fn bump(&self) {
        self.step.send_modify(|s| *s += 1);
    }

    pub fn violation(&self, what: impl Into<String>) {
        self.violations.lock().push(what.into());
    }

    pub fn assert_clean(&self) {
        let violations = self.violations.lock();
        assert!(violations.is_empty(), "violations: {violations:?}");
    }

    /// Waits (bounded) until `cond` holds, re-checking after every callback
    /// and every transition.
    pub async fn wait_until(&self, what: &str, mut cond: impl FnMut() -> bool) {
        let mut steps = self.step.subscribe();
        let reached = matches!(
            tokio::time::timeout(BOUND, steps.wait_for(|_| cond())).await,
            Ok(Ok(_))
        );
        assert!(reached, "timed out waiting for {what}");
    }
}

/// Implementation object that checks callback ordering as it goes.
pub struct Recorder {
    pub counters: Arc<Counters>,
    required: usize,
    bound: i64,
    configured: bool,
    active: bool,
}

impl Recorder {
    pub fn new(counters: Arc<Counters>, required: usize) -> Self {
        Self {
            counters,
            required,
            bound: 0,
            configured: false,
            active: false,
        }
    }
}

impl Lifecycle for Recorder {
    fn start(&mut self) -> Result<(), CallbackError> {
        if self.active {
            self.counters.violation("start while active");
        }
        if self.bound != self.required as i64 || !self.configured {
            self.counters.violation(format!(
                "start with bound={} configured={}",
                self.bound, self.configured
            ));
        }
        self.active = true;
        self.counters.hit(&self.counters.starts);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CallbackError> {
        if !self.active {
            self.counters.violation("stop while not active");
        }
        self.counters.hit(&self.counters.stops);
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), CallbackError> {
        if !self.active {
            self.counters.violation("destroy while not active");
        }
        self.active = false;
        self.counters.hit(&self.counters.destroys);
        Ok(())
    }
}

/// A component with `n` required dependencies and one required configuration dependency.
pub struct Fixture {
    pub component: Component<Recorder>,
    pub deps: Vec<Dependency<Recorder>>,
    pub config: ConfigurationDependency<Recorder>,
    pub counters: Arc<Counters>,
}

impl Fixture {
    pub fn new(n: usize) -> Self {
        let counters = Counters::new();

        let deps: Vec<Dependency<Recorder>> = (0..n)
            .map(|i| {
                Dependency::builder(format!("dep-{i}"))
                    .required(true)
                    .on_add(|r: &mut Recorder, _| {
                        r.bound += 1;
                        r.counters.hit(&r.counters.adds);
                        Ok(())
                    })
                    .on_remove(|r: &mut Recorder, _| {
                        r.bound -= 1;
                        if r.bound < 0 {
                            r.counters.violation("bound count went negative");
                        }
                        r.counters.hit(&r.counters.removes);
                        Ok(())
                    })
                    .build()
            })
            .collect();

        let config = ConfigurationDependency::builder("config")
            .on_updated(|r: &mut Recorder, cfg: Option<&Configuration>| {
                match cfg {
                    Some(_) => {
                        r.configured = true;
                        r.counters.hit(&r.counters.cfg_binds);
                    }
                    None => {
                        r.configured = false;
                        r.counters.hit(&r.counters.cfg_unbinds);
                    }
                }
                Ok(())
            })
            .build();

        let step = Arc::clone(&counters);
        let mut builder = Component::builder(ComponentConfig::named("race"))
            .implementation(Recorder::new(Arc::clone(&counters), n))
            .listener(Arc::new(move |_: &Component<Recorder>, _: ComponentState| {
                step.bump();
            }));
        for dep in &deps {
            builder = builder.attach(dep);
        }
        let component = builder.attach(&config).build().expect("fixture builds");

        Self {
            component,
            deps,
            config,
            counters,
        }
    }

    pub fn event(i: usize) -> Event {
        Event::new(i as u64 + 1)
    }

    pub fn bound_dependency_count(&self) -> usize {
        self.deps.iter().map(Dependency::bound_count).sum()
    }
}
