pub mod compress;
pub mod extract;
pub mod show;

pub use compress::*;
pub use extract::*;
pub use show::*;

use crate::error::{PerzipError, Result};

/// Run `op` on a dedicated rayon pool of `threads` workers, or on the global
/// pool when no count is given.
pub(crate) fn run_with_threads<T, F>(threads: Option<usize>, op: F) -> Result<T>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    match threads {
        None => op(),
        Some(0) => Err(PerzipError::Configuration(
            "thread count must be at least 1".into(),
        )),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| PerzipError::Configuration(format!("thread pool: {}", e)))?;
            pool.install(op)
        }
    }
}
