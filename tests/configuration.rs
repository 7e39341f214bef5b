//! Configuration delivery: rejection, withdrawal ordering and concurrent updates.

use std::sync::Arc;
use std::thread;

use depvisor::{
    CallbackError, Component, ComponentConfig, ComponentState, Configuration,
    ConfigurationDependency, ConfigurationError, Lifecycle, NoticeKind,
};
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<String>>>;

struct Server {
    log: Log,
    port: Option<u16>,
}

impl Server {
    fn new(log: &Log) -> Self {
        Self {
            log: Arc::clone(log),
            port: None,
        }
    }
}

impl Lifecycle for Server {
    fn start(&mut self) -> Result<(), CallbackError> {
        self.log.lock().push(format!("start:{:?}", self.port));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CallbackError> {
        self.log.lock().push("stop".into());
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), CallbackError> {
        self.log.lock().push("destroy".into());
        Ok(())
    }
}

/// Accepts configurations carrying a numeric `port`.
fn port_config() -> ConfigurationDependency<Server> {
    ConfigurationDependency::builder("server.cfg")
        .on_updated(|s: &mut Server, cfg: Option<&Configuration>| {
            let Some(cfg) = cfg else {
                s.log.lock().push("cfg:none".into());
                s.port = None;
                return Ok(());
            };
            let port = cfg
                .get("port")
                .ok_or_else(|| ConfigurationError::rejected("missing 'port'"))?
                .parse::<u16>()
                .map_err(|e| ConfigurationError::rejected(format!("bad 'port': {e}")))?;
            s.log.lock().push(format!("cfg:{port}"));
            s.port = Some(port);
            Ok(())
        })
        .build()
}

fn server(log: &Log, cfg: &ConfigurationDependency<Server>) -> Component<Server> {
    Component::builder(ComponentConfig::named("server"))
        .implementation(Server::new(log))
        .attach(cfg)
        .build()
        .unwrap()
}

fn port(p: &str) -> Option<Configuration> {
    Some(Configuration::new().with("port", p))
}

#[test]
fn test_rejection_is_synchronous_and_leaves_state_untouched() {
    let log = Log::default();
    let cfg = port_config();
    let c = server(&log, &cfg);
    let mut notices = c.subscribe();
    c.start();

    let err = cfg.updated(Some(Configuration::new())).unwrap_err();
    assert_eq!(err, ConfigurationError::rejected("missing 'port'"));
    assert_eq!(err.as_label(), "configuration_rejected");
    assert_eq!(c.state(), ComponentState::WaitingForRequired);
    assert!(cfg.configuration().is_none());
    assert!(!cfg.is_available());

    cfg.updated(port("8080")).unwrap();
    assert_eq!(c.state(), ComponentState::Active);

    let err = cfg.updated(port("eighty")).unwrap_err();
    assert!(matches!(err, ConfigurationError::Rejected { .. }));
    assert_eq!(c.state(), ComponentState::Active);
    assert_eq!(cfg.configuration().unwrap().get("port"), Some("8080"));

    let mut rejected = 0;
    while let Ok(n) = notices.try_recv() {
        if n.kind == NoticeKind::ConfigurationRejected {
            assert_eq!(n.dependency.as_deref(), Some("server.cfg"));
            rejected += 1;
        }
    }
    assert_eq!(rejected, 2);
    assert_eq!(*log.lock(), vec!["cfg:8080", "start:Some(8080)"]);
}

#[test]
fn test_panicking_consumer_rejects_update() {
    struct Plain;
    impl Lifecycle for Plain {}

    let cfg = ConfigurationDependency::builder("cfg")
        .on_updated(|_: &mut Plain, _: Option<&Configuration>| panic!("parser exploded"))
        .build();
    let c = Component::builder(ComponentConfig::named("svc"))
        .implementation(Plain)
        .attach(&cfg)
        .build()
        .unwrap();

    let err = cfg.updated(Some(Configuration::new())).unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::rejected("callback panicked: parser exploded")
    );
    assert!(cfg.configuration().is_none());
    assert_eq!(c.pending(), 0);
}

#[test]
fn test_withdrawal_deactivates_before_unbind_callback() {
    let log = Log::default();
    let cfg = port_config();
    let c = server(&log, &cfg);
    c.start();

    cfg.updated(port("80")).unwrap();
    cfg.updated(port("81")).unwrap();
    cfg.updated(None).unwrap();
    cfg.updated(None).unwrap();
    assert_eq!(c.state(), ComponentState::WaitingForRequired);

    assert_eq!(
        *log.lock(),
        vec![
            "cfg:80",
            "start:Some(80)",
            "cfg:81",
            "stop",
            "destroy",
            "cfg:none"
        ]
    );
}

#[test]
fn test_optional_configuration_does_not_gate_activation() {
    struct Plain;
    impl Lifecycle for Plain {}

    let cfg = ConfigurationDependency::builder("tuning")
        .required(false)
        .build();
    let c = Component::builder(ComponentConfig::named("svc"))
        .implementation(Plain)
        .attach(&cfg)
        .build()
        .unwrap();

    c.start();
    assert_eq!(c.state(), ComponentState::Active);
    cfg.updated(Some(Configuration::new().with("k", "v"))).unwrap();
    cfg.updated(None).unwrap();
    assert_eq!(c.state(), ComponentState::Active);
    assert!(!cfg.is_required());
}

#[test]
fn test_failed_unbind_completes_and_is_reported() {
    struct Plain;
    impl Lifecycle for Plain {}

    let cfg = ConfigurationDependency::builder("cfg")
        .on_updated(|_: &mut Plain, c: Option<&Configuration>| match c {
            Some(_) => Ok(()),
            None => Err(ConfigurationError::rejected("cannot run unconfigured")),
        })
        .build();
    let c = Component::builder(ComponentConfig::named("svc"))
        .implementation(Plain)
        .attach(&cfg)
        .build()
        .unwrap();
    let mut notices = c.subscribe();
    c.start();

    cfg.updated(Some(Configuration::new())).unwrap();
    assert_eq!(cfg.updated(None), Ok(()));
    assert!(cfg.configuration().is_none());
    assert_eq!(c.state(), ComponentState::WaitingForRequired);

    let failure = std::iter::from_fn(|| notices.try_recv().ok())
        .find(|n| n.kind == NoticeKind::CallbackFailed)
        .expect("unbind failure reported");
    assert_eq!(
        failure.reason.as_deref(),
        Some("updated: callback failed: configuration rejected: cannot run unconfigured")
    );
}

#[test]
fn test_concurrent_updates_each_get_a_verdict() {
    const WRITERS: u16 = 16;

    let log = Log::default();
    let cfg = port_config();
    let c = server(&log, &cfg);
    c.start();

    let writers: Vec<_> = (0..WRITERS)
        .map(|i| {
            let cfg = cfg.clone();
            thread::spawn(move || {
                let value = if i % 2 == 0 { (9000 + i).to_string() } else { "x".into() };
                (i, cfg.updated(port(&value)))
            })
        })
        .collect();

    for w in writers {
        let (i, verdict) = w.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(verdict, Ok(()));
        } else {
            assert!(matches!(verdict, Err(ConfigurationError::Rejected { .. })));
        }
    }

    assert_eq!(c.state(), ComponentState::Active);
    let current: u16 = cfg
        .configuration()
        .and_then(|c| c.get("port").map(str::to_string))
        .unwrap()
        .parse()
        .unwrap();
    assert!(current >= 9000 && current % 2 == 0);
    let binds = log.lock().iter().filter(|e| e.starts_with("cfg:")).count();
    assert_eq!(binds, (WRITERS / 2) as usize);
    assert_eq!(
        log.lock().iter().filter(|e| e.starts_with("start")).count(),
        1
    );
}
