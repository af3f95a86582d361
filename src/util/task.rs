//! Fire-and-forget background futures whose results are picked up by the
//! UI on a later frame.
//!
//! Native builds spawn onto one multi-threaded `tokio` runtime shared by the
//! whole app (which `reqwest` needs); the web build hands tasks to the
//! browser's microtask queue, where futures don't have to be `Send`.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

/// `Send` on native, nothing on the web where everything stays on one thread.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

/// `Sync` on native, nothing on the web.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSync: Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Sync> MaybeSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSync {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSync for T {}

/// Result slot of a spawned task.
#[derive(Debug)]
pub struct Pending<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Pending<T> {
    /// Takes the result if the task has finished. Returns `Some` only once.
    pub fn try_take(&self) -> Option<T> {
        self.slot.lock().take()
    }
}

/// Handle to the app's task runtime. Cheap to clone; every clone spawns
/// onto the same runtime.
#[derive(Debug, Clone)]
pub struct Spawner {
    #[cfg(not(target_arch = "wasm32"))]
    runtime: Arc<tokio::runtime::Runtime>,
}

impl Spawner {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("collage-tasks")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Spawns `future` and returns a slot for its output.
    ///
    /// When `repaint` is given, the UI is woken once the result is in.
    pub fn spawn<T, Fut>(&self, repaint: Option<egui::Context>, future: Fut) -> Pending<T>
    where
        Fut: Future<Output = T> + MaybeSend + 'static,
        T: MaybeSend + 'static,
    {
        let slot = Arc::new(Mutex::new(None));
        let task_slot = Arc::clone(&slot);
        let task = async move {
            let value = future.await;
            *task_slot.lock() = Some(value);
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        drop(self.runtime.spawn(task));

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);

        Pending { slot }
    }
}
