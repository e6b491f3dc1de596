use std::cell::{Cell, RefCell};
use std::rc::Rc;

use aqua_visual::{
    AppError, BackendRegistry, NativeBackend, NativeRenderer, Renderer, RendererConfig, Result,
    create,
};

/// Tracks native handles the way a leak checker would.
#[derive(Default)]
struct Counters {
    live: Cell<i32>,
    acquired: Cell<u32>,
    released: Cell<u32>,
    constructed: Cell<u32>,
    last_config: RefCell<Option<RendererConfig>>,
}

impl Counters {
    fn acquire(&self) {
        self.live.set(self.live.get() + 1);
        self.acquired.set(self.acquired.get() + 1);
    }

    fn release(&self) {
        self.live.set(self.live.get() - 1);
        self.released.set(self.released.get() + 1);
    }
}

struct CountingBackend {
    features: usize,
    fail_context: bool,
    counters: Rc<Counters>,
}

struct Handle;

impl NativeBackend for CountingBackend {
    const NAME: &'static str = "counting";
    type Context = Handle;

    fn query_capabilities(&mut self) -> Result<Vec<String>> {
        Ok((0..self.features).map(|i| format!("ext_{i}")).collect())
    }

    fn create_context(&mut self, config: &RendererConfig) -> Result<Handle> {
        *self.counters.last_config.borrow_mut() = Some(config.clone());
        // Instance first, then the device; a rejected device gives the instance back
        self.counters.acquire();
        if self.fail_context {
            self.counters.release();
            return Err(AppError::Initialization {
                stage: "device",
                reason: "driver rejected configuration".to_owned(),
            });
        }
        Ok(Handle)
    }

    fn destroy_context(&mut self, _context: Handle) {
        self.counters.release();
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registry(features: usize, fail_context: bool) -> (BackendRegistry, Rc<Counters>) {
    init_logging();
    let counters = Rc::new(Counters::default());
    let shared = counters.clone();
    let mut registry = BackendRegistry::empty();
    registry.register("counting", move || -> Box<dyn Renderer> {
        shared.constructed.set(shared.constructed.get() + 1);
        Box::new(NativeRenderer::new(CountingBackend {
            features,
            fail_context,
            counters: shared.clone(),
        }))
    });
    (registry, counters)
}

#[test]
fn zero_features_yields_no_renderer_and_no_resources() {
    let (registry, counters) = registry(0, false);

    let result = create(&registry, RendererConfig::default());

    assert!(matches!(result, Err(AppError::Unavailable(_))));
    assert_eq!(counters.constructed.get(), 1);
    assert_eq!(counters.acquired.get(), 0);
    assert_eq!(counters.live.get(), 0);
}

#[test]
fn supported_backend_yields_initialized_renderer() {
    let (registry, counters) = registry(3, false);

    let renderer = create(&registry, RendererConfig::default().with_size(1024, 768))
        .unwrap_or_else(|e| panic!("create failed: {e}"));

    assert!(renderer.is_initialized());
    assert_eq!(renderer.backend_name(), "counting");
    assert_eq!(renderer.capabilities().len(), 3);
    assert_eq!(renderer.config().width, 1024);
    assert_eq!(counters.live.get(), 1);
}

#[test]
fn failed_context_releases_partial_handles() {
    let (registry, counters) = registry(2, true);

    let result = create(&registry, RendererConfig::default());

    match result {
        Err(AppError::Initialization { stage, .. }) => assert_eq!(stage, "device"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("renderer must not be returned"),
    }
    assert_eq!(counters.acquired.get(), 1);
    assert_eq!(counters.live.get(), 0);
}

#[test]
fn double_shutdown_is_a_noop() {
    let (registry, counters) = registry(1, false);
    let mut renderer = match create(&registry, RendererConfig::default()) {
        Ok(renderer) => renderer,
        Err(e) => panic!("create failed: {e}"),
    };

    renderer.shutdown();
    assert!(!renderer.is_initialized());
    assert_eq!(counters.live.get(), 0);

    renderer.shutdown();
    assert_eq!(counters.released.get(), 1);

    drop(renderer);
    assert_eq!(counters.released.get(), 1);
}

#[test]
fn dropping_a_ready_renderer_returns_to_baseline() {
    let (registry, counters) = registry(1, false);
    let baseline = counters.live.get();

    let renderer = create(&registry, RendererConfig::default()).ok();
    assert!(renderer.as_ref().is_some_and(|r| r.is_initialized()));
    drop(renderer);

    assert_eq!(counters.live.get(), baseline);
    assert_eq!(counters.released.get(), 1);
}

#[test]
fn create_never_exposes_partial_renderers() {
    for (features, fail) in [(0, false), (0, true), (1, false), (1, true), (5, true)] {
        let (registry, counters) = registry(features, fail);
        match create(&registry, RendererConfig::default()) {
            Ok(renderer) => assert!(renderer.is_initialized()),
            Err(e) => {
                assert!(e.is_recoverable());
                assert_eq!(counters.live.get(), 0);
            }
        }
    }
}

#[test]
fn unknown_backend_constructs_nothing() {
    let (registry, counters) = registry(1, false);

    let result = create(&registry, RendererConfig::default().with_backend("metal"));

    assert!(matches!(result, Err(AppError::UnknownBackend(name)) if name == "metal"));
    assert_eq!(counters.constructed.get(), 0);
}

#[test]
fn empty_registry_reports_unknown_backend() {
    init_logging();
    let result = create(&BackendRegistry::empty(), RendererConfig::default());
    assert!(matches!(result, Err(AppError::UnknownBackend(_))));
}

/// Records lifecycle calls without owning any native state.
struct Recorder {
    config: RendererConfig,
    calls: Rc<Cell<u32>>,
    shutdowns: Rc<Cell<u32>>,
}

impl Renderer for Recorder {
    fn backend_name(&self) -> &'static str {
        "recorder"
    }

    fn set_config(&mut self, config: RendererConfig) {
        self.calls.set(self.calls.get() * 10 + 1);
        self.config = config;
    }

    fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn initialize(&mut self) -> Result<()> {
        self.calls.set(self.calls.get() * 10 + 2);
        Err(AppError::Unavailable("no device".to_owned()))
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn capabilities(&self) -> &[String] {
        &[]
    }

    fn shutdown(&mut self) {
        self.calls.set(self.calls.get() * 10 + 3);
        self.shutdowns.set(self.shutdowns.get() + 1);
    }
}

#[test]
fn factory_configures_initializes_then_cleans_up_failures() {
    init_logging();
    let calls = Rc::new(Cell::new(0));
    let shutdowns = Rc::new(Cell::new(0));
    let (c, s) = (calls.clone(), shutdowns.clone());

    let mut registry = BackendRegistry::empty();
    registry.register("recorder", move || -> Box<dyn Renderer> {
        Box::new(Recorder {
            config: RendererConfig::default(),
            calls: c.clone(),
            shutdowns: s.clone(),
        })
    });

    let config = RendererConfig::default().with_title("ordered");
    assert!(create(&registry, config).is_err());

    // set_config, initialize, shutdown, in that order
    assert_eq!(calls.get(), 123);
    assert_eq!(shutdowns.get(), 1);
}

#[test]
fn requested_backend_overrides_default() {
    let (mut registry, counters) = registry(1, false);
    let calls = Rc::new(Cell::new(0));
    let shutdowns = Rc::new(Cell::new(0));
    let (c, s) = (calls.clone(), shutdowns.clone());
    registry.register("recorder", move || -> Box<dyn Renderer> {
        Box::new(Recorder {
            config: RendererConfig::default(),
            calls: c.clone(),
            shutdowns: s.clone(),
        })
    });

    let renderer = create(&registry, RendererConfig::default().with_backend("counting"));
    assert!(renderer.is_ok_and(|r| r.backend_name() == "counting"));
    assert_eq!(calls.get(), 0);

    assert!(create(&registry, RendererConfig::default().with_backend("recorder")).is_err());
    assert_eq!(shutdowns.get(), 1);
    assert_eq!(counters.constructed.get(), 1);
}

#[test]
fn backend_receives_the_requested_config() {
    let (registry, counters) = registry(1, false);
    let config = RendererConfig::default()
        .with_size(321, 123)
        .with_title("config check")
        .with_vsync(false)
        .with_max_frames_in_flight(3);

    let renderer = create(&registry, config.clone()).unwrap_or_else(|e| panic!("create failed: {e}"));
    assert_eq!(renderer.config(), &config);
    assert_eq!(counters.last_config.borrow().as_ref(), Some(&config));
}
