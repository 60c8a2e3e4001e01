//! # Runtime
//!
//! Standardized [Tokio](https://tokio.rs) runtime construction for Lumo binaries.
//!
//! Image and video transcoding runs on Tokio's blocking pool, so besides worker threads
//! every profile also bounds the number of blocking threads a burst of imports may spawn.
//!
//! ## Profiles
//! * **High Performance**: Long-running processes (slideshow hosts) with generous pools.
//! * **Memory Efficient**: Short-lived tools such as the CLI.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[lumo_runtime::main(memory_efficient)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use lumo_derive::main;

use anyhow::anyhow;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// The default stack size for threads (3 `MiB`).
const DEFAULT_STACK_SIZE: usize = 3 * 1024 * 1024;
/// Minimum allowed stack size (1 `MiB`).
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
/// Upper bound for blocking threads (decoders hold full frames in memory).
const MAX_BLOCKING_THREADS: usize = 64;
/// How long an idle thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

fn detected_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= 1024)
            .unwrap_or_else(|| {
                available_parallelism()
                    .map(std::num::NonZero::get)
                    .unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub blocking_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let workers = detected_worker_threads();
        Self {
            worker_threads: workers,
            blocking_threads: (workers * 2).min(MAX_BLOCKING_THREADS),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "lumo-worker".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl RuntimeConfig {
    /// Preset for long-running display hosts.
    #[must_use = "Use this configuration for long-running processes"]
    pub fn high_performance() -> Self {
        let workers = detected_worker_threads();
        Self {
            worker_threads: workers,
            blocking_threads: (workers * 4).min(MAX_BLOCKING_THREADS),
            stack_size: 4 * 1024 * 1024,
            thread_name: "lumo-hp".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
        }
    }

    /// Preset for short-lived tools where memory footprint matters.
    #[must_use = "Use this configuration for short-lived tools"]
    pub fn memory_efficient() -> Self {
        let workers = (detected_worker_threads() / 2).max(1);
        Self {
            worker_threads: workers,
            blocking_threads: workers.max(2),
            stack_size: 2 * 1024 * 1024,
            thread_name: "lumo-mem".to_owned(),
            thread_keep_alive: Duration::from_secs(30),
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, 1024);
        self
    }

    #[must_use = "Customize the blocking pool used by transcoding"]
    pub fn with_blocking_threads(mut self, threads: usize) -> Self {
        self.blocking_threads = threads.clamp(1, MAX_BLOCKING_THREADS);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name = if name.trim().is_empty() { "lumo-worker".to_owned() } else { name };
        self
    }

    fn normalized(&self) -> Self {
        self.clone()
            .with_worker_threads(self.worker_threads)
            .with_blocking_threads(self.blocking_threads)
            .with_stack_size(self.stack_size)
            .with_thread_name(self.thread_name.clone())
    }
}

/// Creates a multi-threaded Tokio runtime from `config`.
///
/// Values outside the supported ranges are clamped before the runtime is built.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(config = ?config, "Building tokio runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .max_blocking_threads(config.blocking_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}
