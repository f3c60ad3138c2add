//! Parallel processing utilities
//!
//! Every helper takes a `parallel` flag; with it off the work runs in order on
//! the calling thread. Output order always matches input order.

use rayon::prelude::*;

/// Execute a function on a collection of items
pub fn parallel_process<T, F, R>(items: Vec<T>, parallel: bool, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    if parallel {
        items.into_par_iter().map(f).collect()
    } else {
        items.into_iter().map(f).collect()
    }
}

/// Run `f` on every element in place
pub fn parallel_for_each_mut<T, F>(items: &mut [T], parallel: bool, f: F)
where
    T: Send,
    F: Fn(&mut T) + Send + Sync,
{
    if parallel {
        items.par_iter_mut().for_each(f);
    } else {
        items.iter_mut().for_each(f);
    }
}
