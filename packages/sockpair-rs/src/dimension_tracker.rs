//! Keeps the rendered size of the displayed photo current across load and
//! viewport resize events.
//!
//! Resize notifications go through an explicit [`ResizeEvents`] bus rather
//! than global state, so independent display surfaces never see each
//! other's listeners.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::debug;
use tokio::sync::watch;

use crate::coordinates::Dimensions;

/// Something that shows the photo on screen and can report its laid-out size.
pub trait DisplaySurface: Send + Sync {
    /// `None` while nothing is displayed or layout is not known yet.
    fn rendered_size(&self) -> Option<Dimensions>;
}

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// Viewport resize notifications.
#[derive(Clone, Default)]
pub struct ResizeEvents {
    registry: Arc<Mutex<Registry>>,
}

impl ResizeEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ResizeSubscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Arc::new(listener));
        ResizeSubscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    /// Runs every registered listener synchronously, in registration order.
    pub fn emit(&self) {
        // Snapshot first so listeners may subscribe or cancel while running.
        let listeners: Vec<Listener> = lock(&self.registry).listeners.values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

/// Deregisters its listener when cancelled or dropped.
pub struct ResizeSubscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl ResizeSubscription {
    pub fn cancel(self) {}
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.remove(&self.id);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Shared {
    surface: Mutex<Option<Arc<dyn DisplaySurface>>>,
    tx: watch::Sender<Dimensions>,
}

impl Shared {
    fn refresh(&self) {
        let Some(surface) = lock(&self.surface).clone() else {
            return;
        };
        // Nothing displayed reads as (0, 0) so stale geometry is not kept.
        let dims = surface.rendered_size().unwrap_or(Dimensions::ZERO);
        self.tx.send_if_modified(|current| {
            if *current == dims {
                return false;
            }
            debug!("display size {}x{}", dims.width, dims.height);
            *current = dims;
            true
        });
    }
}

/// Current rendered size of one display surface.
pub struct DimensionTracker {
    shared: Arc<Shared>,
    subscription: Option<ResizeSubscription>,
}

impl DimensionTracker {
    /// Starts at `(0, 0)` and listens for resize events until detached.
    pub fn attach(surface: Arc<dyn DisplaySurface>, events: &ResizeEvents) -> Self {
        let (tx, _rx) = watch::channel(Dimensions::ZERO);
        let shared = Arc::new(Shared {
            surface: Mutex::new(Some(surface)),
            tx,
        });
        let weak = Arc::downgrade(&shared);
        let subscription = events.subscribe(move || {
            if let Some(shared) = weak.upgrade() {
                shared.refresh();
            }
        });
        Self {
            shared,
            subscription: Some(subscription),
        }
    }

    /// Image load completion: the first moment layout is knowable.
    pub fn on_load(&self) {
        self.shared.refresh();
    }

    pub fn dimensions(&self) -> Dimensions {
        *self.shared.tx.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<Dimensions> {
        self.shared.tx.subscribe()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Stops listening, forgets the surface and reports `(0, 0)` from now on.
    pub fn detach(&mut self) {
        self.subscription.take();
        lock(&self.shared.surface).take();
        self.shared.tx.send_replace(Dimensions::ZERO);
    }
}

/// A photo laid out at full container width with its height following the
/// natural aspect ratio.
pub struct ResponsiveImage {
    natural_width: u32,
    natural_height: u32,
    container_width: AtomicU64,
    loaded: AtomicBool,
}

impl ResponsiveImage {
    pub fn new(natural_width: u32, natural_height: u32, container_width: f64) -> Self {
        Self {
            natural_width,
            natural_height,
            container_width: AtomicU64::new(container_width.to_bits()),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    pub fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }

    pub fn set_container_width(&self, width: f64) {
        self.container_width.store(width.to_bits(), Ordering::SeqCst);
    }

    fn container_width(&self) -> f64 {
        f64::from_bits(self.container_width.load(Ordering::SeqCst))
    }
}

impl DisplaySurface for ResponsiveImage {
    fn rendered_size(&self) -> Option<Dimensions> {
        if !self.loaded.load(Ordering::SeqCst) || self.natural_width == 0 {
            return None;
        }
        let width = self.container_width();
        let height = width * self.natural_height as f64 / self.natural_width as f64;
        Some(Dimensions::new(width, height))
    }
}
