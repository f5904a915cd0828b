//! Runtime abstraction for the crate's only asynchronous work: fetching icon assets.
//!
//! With `tokio-runtime` the future runs on the ambient Tokio runtime when there is one, and on
//! a small lazily-built runtime otherwise. Without it, a dedicated thread drives the future with
//! `futures::executor::block_on`.

use futures::Future;
use std::pin::Pin;

/// A trait for spawning detached tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned task
pub trait AsyncHandle: Send + Sync {
    fn is_finished(&self) -> bool;
}

/// Spawns `future` on the default spawner
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

/// The default spawner for the enabled features
#[cfg(feature = "tokio-runtime")]
pub fn runtime() -> &'static dyn AsyncSpawner {
    &spawners::tokio_impl::TokioSpawner
}

/// The default spawner for the enabled features
#[cfg(not(feature = "tokio-runtime"))]
pub fn runtime() -> &'static dyn AsyncSpawner {
    &spawners::thread_impl::ThreadSpawner
}

pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::{runtime::Handle, task::JoinHandle};
        use once_cell::sync::Lazy;

        static FALLBACK_RUNTIME: Lazy<::tokio::runtime::Runtime> = Lazy::new(|| {
            ::tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("spritelet-assets")
                .enable_all()
                .build()
                .expect("failed to build asset loading runtime")
        });

        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Box<dyn AsyncHandle> {
                let handle = match Handle::try_current() {
                    Ok(current) => current.spawn(future),
                    Err(_) => FALLBACK_RUNTIME.spawn(future),
                };
                Box::new(TokioHandle(handle))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }
        }
    }

    pub mod thread_impl {
        use super::*;
        use std::sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        };

        pub struct ThreadSpawner;

        impl AsyncSpawner for ThreadSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Box<dyn AsyncHandle> {
                let finished = Arc::new(AtomicBool::new(false));
                let flag = finished.clone();
                std::thread::spawn(move || {
                    futures::executor::block_on(future);
                    flag.store(true, Ordering::Release);
                });
                Box::new(ThreadHandle(finished))
            }
        }

        struct ThreadHandle(Arc<AtomicBool>);

        impl AsyncHandle for ThreadHandle {
            fn is_finished(&self) -> bool {
                self.0.load(Ordering::Acquire)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(handle: &dyn AsyncHandle) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if handle.is_finished() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_thread_spawner_runs_future() {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let handle = spawners::thread_impl::ThreadSpawner.spawn_boxed(Box::pin(async move {
            sender.send(42).unwrap();
        }));
        assert!(wait_for(handle.as_ref()));
        assert_eq!(receiver.recv().unwrap(), 42);
    }

    #[test]
    fn test_default_spawner_outside_runtime() {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let handle = spawn(async move {
            sender.send("done").unwrap();
        });
        assert_eq!(
            receiver.recv_timeout(Duration::from_secs(5)).unwrap(),
            "done"
        );
        assert!(wait_for(handle.as_ref()));
    }
}
