//! Runner phase ordering and shutdown handling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use modkit::{
    context::{ConfigProvider, ModuleCtx},
    contracts::{Module, RestHostModule, RestfulModule, StatefulModule},
    registry::ModuleRegistry,
    runtime::{run, RunOptions, ShutdownOptions},
};

type CallTracker = Arc<Mutex<Vec<String>>>;

struct EmptyConfig(HashMap<String, serde_json::Value>);

impl ConfigProvider for EmptyConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get(module_name)
    }
}

struct Tracked {
    name: &'static str,
    calls: CallTracker,
    fail_init: bool,
}

impl Tracked {
    fn record(&self, what: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, what));
    }
}

#[async_trait::async_trait]
impl Module for Tracked {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        assert_eq!(ctx.current_module(), Some(self.name));
        self.record("init");
        if self.fail_init {
            anyhow::bail!("boom");
        }
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestfulModule for Tracked {
    fn register_rest(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
        self.record("rest");
        Ok(router)
    }
}

impl RestHostModule for Tracked {
    fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
        self.record("prepare");
        Ok(router)
    }
    fn rest_finalize(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
        self.record("finalize");
        Ok(router)
    }
}

#[async_trait::async_trait]
impl StatefulModule for Tracked {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.record("start");
        Ok(())
    }
    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.record("stop");
        Ok(())
    }
}

fn tracked(name: &'static str, calls: &CallTracker, fail_init: bool) -> Arc<Tracked> {
    Arc::new(Tracked {
        name,
        calls: calls.clone(),
        fail_init,
    })
}

fn registry(calls: &CallTracker, fail_leaf: bool) -> ModuleRegistry {
    let host = tracked("host", calls, false);
    let leaf = tracked("leaf", calls, fail_leaf);

    let mut b = ModuleRegistry::builder();
    b.register_core_with_meta("leaf", &["host"], leaf.clone())
        .register_rest_with_meta("leaf", leaf)
        .register_core_with_meta("host", &[], host.clone())
        .register_rest_host_with_meta("host", host.clone())
        .register_stateful_with_meta("host", host);
    b.build_topo_sorted().unwrap()
}

fn options(registry: ModuleRegistry, shutdown: ShutdownOptions) -> RunOptions {
    RunOptions {
        modules_cfg: Arc::new(EmptyConfig(HashMap::new())),
        registry,
        shutdown,
    }
}

#[tokio::test]
async fn phases_run_in_order_until_token_is_cancelled() {
    let calls: CallTracker = Arc::default();
    let token = CancellationToken::new();

    let handle = tokio::spawn(run(options(
        registry(&calls, false),
        ShutdownOptions::Token(token.clone()),
    )));

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    timeout(Duration::from_secs(1), handle)
        .await
        .expect("runner should stop after cancellation")
        .unwrap()
        .unwrap();

    let calls = calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            "host:init",
            "leaf:init",
            "host:prepare",
            "leaf:rest",
            "host:finalize",
            "host:start",
            "host:stop",
        ]
    );
}

#[tokio::test]
async fn completed_future_triggers_shutdown() {
    let calls: CallTracker = Arc::default();
    let waiter = Box::pin(tokio::time::sleep(Duration::from_millis(10)));

    timeout(
        Duration::from_secs(1),
        run(options(registry(&calls, false), ShutdownOptions::Future(waiter))),
    )
    .await
    .expect("runner should stop when the future completes")
    .unwrap();

    assert!(calls.lock().unwrap().contains(&"host:stop".to_string()));
}

#[tokio::test]
async fn init_failure_aborts_before_rest_phase() {
    let calls: CallTracker = Arc::default();
    let err = run(options(
        registry(&calls, true),
        ShutdownOptions::Token(CancellationToken::new()),
    ))
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "initialization failed for module 'leaf'");
    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["host:init", "leaf:init"]);
}
