use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::JoinSet;

use super::{BoxError, InitError};

type SlotWriter<S> = Box<dyn FnOnce(&mut S) + Send>;
type UnitFuture<S> = Pin<Box<dyn Future<Output = Result<SlotWriter<S>, BoxError>> + Send>>;

/// Independent constructor run in the concurrent phase
///
/// The produced handle is written into its slot only after every unit of the
/// phase has succeeded.
pub struct InitUnit<S> {
    name: &'static str,
    future: UnitFuture<S>,
}

impl<S: 'static> InitUnit<S> {
    pub fn new<Fut, T, E, W>(name: &'static str, build: Fut, store: W) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError>,
        W: FnOnce(&mut S, T) + Send + 'static,
    {
        let future = async move {
            let value = build.await.map_err(Into::<BoxError>::into)?;
            let writer: SlotWriter<S> = Box::new(move |slots: &mut S| store(slots, value));
            Ok::<_, BoxError>(writer)
        };

        Self {
            name,
            future: Box::pin(future),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Constructor that reads slots filled by earlier units
pub struct DependentUnit<S> {
    name: &'static str,
    build: Box<dyn FnOnce(&mut S) -> Result<(), BoxError> + Send>,
}

impl<S: 'static> DependentUnit<S> {
    pub fn new<F, E>(name: &'static str, build: F) -> Self
    where
        F: FnOnce(&mut S) -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            name,
            build: Box::new(move |slots: &mut S| build(slots).map_err(Into::into)),
        }
    }
}

/// Two-pass construction list: concurrent units, then dependent units in order
pub struct InitPlan<S> {
    concurrent: Vec<InitUnit<S>>,
    dependent: Vec<DependentUnit<S>>,
}

impl<S> Default for InitPlan<S> {
    fn default() -> Self {
        Self {
            concurrent: Vec::new(),
            dependent: Vec::new(),
        }
    }
}

impl<S: 'static> InitPlan<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(mut self, unit: InitUnit<S>) -> Self {
        self.concurrent.push(unit);
        self
    }

    pub fn then(mut self, unit: DependentUnit<S>) -> Self {
        self.dependent.push(unit);
        self
    }
}

/// Run an init plan and return the populated slot arena
///
/// Every concurrent unit starts at once and the whole phase shares one
/// `deadline`. On expiry the remaining units are aborted and the call fails.
/// When a unit fails or panics, the first failure to arrive is reported, but
/// only after every other unit has finished. The dependent phase runs after a
/// clean concurrent phase, one unit at a time, outside the deadline.
pub async fn initialize_all<S>(plan: InitPlan<S>, deadline: Duration) -> Result<S, InitError>
where
    S: Default + Send + 'static,
{
    let InitPlan {
        concurrent,
        dependent,
    } = plan;
    let started = Instant::now();

    tracing::info!(
        units = concurrent.len(),
        deadline_ms = deadline.as_millis() as u64,
        "🚀 Starting concurrent initialization"
    );

    let mut pending: Vec<&'static str> = concurrent.iter().map(InitUnit::name).collect();
    let mut units = JoinSet::new();
    for unit in concurrent {
        let InitUnit { name, future } = unit;
        units.spawn(async move { (name, AssertUnwindSafe(future).catch_unwind().await) });
    }

    let mut writers: Vec<SlotWriter<S>> = Vec::new();
    let mut first_error: Option<InitError> = None;

    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            joined = units.join_next() => {
                let Some(joined) = joined else {
                    break;
                };

                let (name, outcome) = match joined {
                    Ok(done) => done,
                    Err(e) => {
                        tracing::error!("❌ Init task terminated abnormally: {}", e);
                        first_error.get_or_insert_with(|| InitError::UnitPanicked {
                            unit: "<unknown>".to_string(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                };

                if let Some(position) = pending.iter().position(|n| *n == name) {
                    pending.swap_remove(position);
                }

                match outcome {
                    Ok(Ok(writer)) => {
                        tracing::info!(unit = name, "✅ Initialized in {:?}", started.elapsed());
                        writers.push(writer);
                    }
                    Ok(Err(source)) => {
                        tracing::error!(unit = name, "❌ Initialization failed: {}", source);
                        first_error.get_or_insert_with(|| InitError::UnitFailed {
                            unit: name.to_string(),
                            source,
                        });
                    }
                    Err(panic) => {
                        let message = panic_message(&*panic);
                        tracing::error!(unit = name, "❌ Initialization panicked: {}", message);
                        first_error.get_or_insert_with(|| InitError::UnitPanicked {
                            unit: name.to_string(),
                            message,
                        });
                    }
                }
            }
            _ = &mut timer => {
                units.abort_all();
                pending.sort_unstable();
                tracing::error!(
                    "⏰ Initialization timed out after {:?}, still pending: {:?}",
                    deadline,
                    pending
                );
                return Err(InitError::Timeout {
                    deadline,
                    pending: pending.into_iter().map(str::to_string).collect(),
                });
            }
        }
    }

    if let Some(error) = first_error {
        return Err(error);
    }

    let mut slots = S::default();
    for write in writers {
        write(&mut slots);
    }

    for unit in dependent {
        tracing::debug!(unit = unit.name, "Building dependent component");
        (unit.build)(&mut slots).map_err(|source| {
            tracing::error!(unit = unit.name, "❌ Initialization failed: {}", source);
            InitError::UnitFailed {
                unit: unit.name.to_string(),
                source,
            }
        })?;
    }

    tracing::info!("✅ Initialization completed in {:?}", started.elapsed());
    Ok(slots)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
