// Shared test doubles for the loader integration tests
#![allow(dead_code)]


use anyhow::anyhow;
use async_trait::async_trait;
use monaco_loader::{
    Bootstrap, Environment, LibraryInstance, Loader, LoaderConfig, MainModule, Script,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Stand-in for the editor library object
#[derive(Debug)]
pub struct FakeMonaco {
    pub id: usize,
    pub editor: bool,
}

impl FakeMonaco {
    pub fn new(id: usize) -> Arc<Self> {
        Arc::new(Self { id, editor: true })
    }

    /// A global object that lacks the `editor` namespace.
    pub fn without_editor(id: usize) -> Arc<Self> {
        Arc::new(Self { id, editor: false })
    }
}

impl LibraryInstance for FakeMonaco {
    fn has_editor(&self) -> bool {
        self.editor
    }
}

/// What the fake page and module loader were asked to do
#[derive(Debug, Clone, Default)]
pub struct LoadMetrics {
    /// Number of global instance probes
    pub probe_calls: usize,
    /// Scripts injected, in order
    pub scripts: Vec<Script>,
    /// Configs handed to the module loader, one per bootstrap call
    pub bootstrap_configs: Vec<LoaderConfig>,
}

impl LoadMetrics {
    pub fn bootstrap_calls(&self) -> usize {
        self.bootstrap_configs.len()
    }
}

/// How `vs/editor/editor.main` resolves
#[derive(Debug, Clone, Default)]
pub enum ModuleOutcome {
    #[default]
    Direct,
    Namespaced,
    Error(String),
}

/// Fake document: optional global instance, scripted load result, optional gate
pub struct RecordingEnvironment {
    global: Option<Arc<FakeMonaco>>,
    script_error: Option<String>,
    gate: Option<Arc<Semaphore>>,
    metrics: Arc<Mutex<LoadMetrics>>,
}

#[async_trait]
impl Environment<FakeMonaco> for RecordingEnvironment {
    fn global_instance(&self) -> Option<Arc<FakeMonaco>> {
        self.metrics.lock().unwrap().probe_calls += 1;
        self.global.clone()
    }

    async fn inject_script(&self, script: Script) -> anyhow::Result<()> {
        self.metrics.lock().unwrap().scripts.push(script.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }

        match &self.script_error {
            Some(message) => Err(anyhow!("error event for {}: {}", script.src, message)),
            None => Ok(()),
        }
    }
}

/// Fake AMD loader; every successful call builds a new `FakeMonaco`
pub struct RecordingBootstrap {
    outcome: ModuleOutcome,
    next_id: AtomicUsize,
    metrics: Arc<Mutex<LoadMetrics>>,
}

#[async_trait]
impl Bootstrap<FakeMonaco> for RecordingBootstrap {
    async fn require_main(
        &self,
        config: &LoaderConfig,
    ) -> anyhow::Result<MainModule<FakeMonaco>> {
        self.metrics
            .lock()
            .unwrap()
            .bootstrap_configs
            .push(config.clone());

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.outcome {
            ModuleOutcome::Direct => Ok(MainModule::Direct(FakeMonaco::new(id))),
            ModuleOutcome::Namespaced => Ok(MainModule::Namespaced {
                m: FakeMonaco::new(id),
            }),
            ModuleOutcome::Error(message) => Err(anyhow!("{}", message)),
        }
    }
}

/// Builder for a loader wired to recording fakes
#[derive(Default)]
pub struct PageBuilder {
    global: Option<Arc<FakeMonaco>>,
    script_error: Option<String>,
    module: ModuleOutcome,
    gated: bool,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(mut self, instance: Arc<FakeMonaco>) -> Self {
        self.global = Some(instance);
        self
    }

    pub fn script_error(mut self, message: &str) -> Self {
        self.script_error = Some(message.to_string());
        self
    }

    pub fn module(mut self, outcome: ModuleOutcome) -> Self {
        self.module = outcome;
        self
    }

    /// Hold every script load until `TestPage::release` is called.
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn build(self) -> TestPage {
        let metrics = Arc::new(Mutex::new(LoadMetrics::default()));
        let gate = Arc::new(Semaphore::new(0));

        let environment = Arc::new(RecordingEnvironment {
            global: self.global,
            script_error: self.script_error,
            gate: self.gated.then(|| Arc::clone(&gate)),
            metrics: Arc::clone(&metrics),
        });
        let bootstrap = Arc::new(RecordingBootstrap {
            outcome: self.module,
            next_id: AtomicUsize::new(0),
            metrics: Arc::clone(&metrics),
        });

        TestPage {
            loader: Loader::new(environment, bootstrap),
            metrics,
            gate,
        }
    }
}

pub struct TestPage {
    pub loader: Loader<FakeMonaco>,
    metrics: Arc<Mutex<LoadMetrics>>,
    gate: Arc<Semaphore>,
}

impl TestPage {
    /// Let `count` pending script loads fire their load/error event.
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    pub fn metrics(&self) -> LoadMetrics {
        self.metrics.lock().unwrap().clone()
    }
}
