//! Bounded fan-out of independent work units.
//!
//! [`run_units`] runs a closure over a slice of units on a rayon pool built
//! for the call, and reports each finished unit back to the calling thread
//! over an `mpsc` channel. The call returns only after every dispatched unit
//! has finished.
//!
//! The first failure stops rayon from starting new units. Units already
//! running finish; their results are drained and dropped. The error returned
//! is the first one the calling thread received.

use crate::config::Parallelism;
use rayon::prelude::*;
use std::sync::mpsc;

/// Run `work` over every unit and call `on_done(index)` on the calling
/// thread as each unit succeeds.
///
/// With [`Parallelism::Sequential`] units run inline, in order. If a pool
/// cannot be built the units also run inline.
pub fn run_units<T, E, W, D>(
    units: &[T],
    parallelism: Parallelism,
    work: W,
    mut on_done: D,
) -> Result<(), E>
where
    T: Sync,
    E: Send,
    W: Fn(&T) -> Result<(), E> + Sync,
    D: FnMut(usize),
{
    let Some(threads) = parallelism.worker_count() else {
        return run_inline(units, &work, &mut on_done);
    };
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            log::warn!("could not start {threads} workers ({e}); running sequentially");
            return run_inline(units, &work, &mut on_done);
        }
    };
    log::debug!("running {} units on {threads} workers", units.len());

    let work = &work;
    std::thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<(usize, Result<(), E>)>();
        scope.spawn(move || {
            pool.install(|| {
                // Err(()) only stops dispatch; the real error travels on the channel.
                let _ = units
                    .par_iter()
                    .enumerate()
                    .try_for_each_with(tx, |tx, (index, unit)| {
                        let result = work(unit);
                        let failed = result.is_err();
                        let _ = tx.send((index, result));
                        if failed { Err(()) } else { Ok(()) }
                    });
            });
        });

        let mut first_error = None;
        for (index, result) in rx {
            match result {
                Ok(()) if first_error.is_none() => on_done(index),
                Ok(()) => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    })
}

fn run_inline<T, E>(
    units: &[T],
    work: &impl Fn(&T) -> Result<(), E>,
    on_done: &mut impl FnMut(usize),
) -> Result<(), E> {
    for (index, unit) in units.iter().enumerate() {
        work(unit)?;
        on_done(index);
    }
    Ok(())
}
