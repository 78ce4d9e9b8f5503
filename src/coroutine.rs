//! Fan-out / fan-in over `may` coroutines.

use crate::config::OrmConfig;
use crate::error::LifeError;
use may::coroutine::Builder;

/// A unit of work run on its own coroutine.
pub(crate) type Job<T> = Box<dyn FnOnce() -> Result<T, LifeError> + Send + 'static>;

/// Run `jobs`, concurrently when `config.fan_out` is set and there is more
/// than one, and collect their results in submission order.
///
/// Each coroutine is spawned with `config.coroutine_stack_size`; the runtime's
/// global default is left alone. Every spawned coroutine is joined before
/// returning, so no work outlives the call. The first error in submission
/// order is returned; a panicking job surfaces as [`LifeError::Coroutine`].
pub(crate) fn join_all<T: Send + 'static>(jobs: Vec<Job<T>>, config: &OrmConfig) -> Result<Vec<T>, LifeError> {
    if !config.fan_out || jobs.len() < 2 {
        return jobs.into_iter().map(|job| job()).collect();
    }

    let mut handles = Vec::with_capacity(jobs.len());
    let mut spawn_error = None;
    for job in jobs {
        let builder = Builder::new().stack_size(config.coroutine_stack_size);
        match may::go!(builder, job) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                spawn_error = Some(LifeError::Coroutine(format!("Failed to spawn coroutine: {e}")));
                break;
            }
        }
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle
            .join()
            .map_err(|e| LifeError::Coroutine(format!("{e:?}")))
            .and_then(|r| r);
        results.push(outcome);
    }
    if let Some(err) = spawn_error {
        return Err(err);
    }
    results.into_iter().collect()
}
