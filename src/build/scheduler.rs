//! Bounded-width batch execution on the rayon pool.

use rayon::prelude::*;

/// Runs actions `0..n` in sequential batches as wide as the current rayon
/// pool (or `n`, if smaller).
///
/// A batch is always awaited in full. If any of its actions failed, the error
/// with the lowest index is returned and no further batch starts.
pub fn run_par<E, F>(n: usize, action: F) -> Result<(), E>
where
    E: Send,
    F: Fn(usize) -> Result<(), E> + Sync + Send,
{
    if n == 0 {
        return Ok(());
    }

    let width = rayon::current_num_threads().clamp(1, n);

    for start in (0..n).step_by(width) {
        let end = (start + width).min(n);

        let results: Vec<Result<(), E>> = (start..end).into_par_iter().map(&action).collect();

        if let Some(err) = results.into_iter().find_map(Result::err) {
            return Err(err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pool(threads: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_succeeds() {
        let calls = AtomicUsize::new(0);
        let res: Result<(), String> = run_par(0, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(res.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_actions_run_once() {
        let seen = Mutex::new(Vec::new());
        let res: Result<(), String> = pool(3).install(|| {
            run_par(10, |i| {
                seen.lock().push(i);
                Ok(())
            })
        });
        assert!(res.is_ok());
        let mut seen = seen.into_inner();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_failure_stops_later_batches() {
        // width 2: batches {0,1} {2,3} {4,5}; action 2 fails in the second batch
        let seen = Mutex::new(Vec::new());
        let res = pool(2).install(|| {
            run_par(6, |i| {
                seen.lock().push(i);
                if i == 2 {
                    Err(format!("action {i} failed"))
                } else {
                    Ok(())
                }
            })
        });
        assert_eq!(res, Err("action 2 failed".to_string()));

        let mut seen = seen.into_inner();
        seen.sort();
        // the sibling in the failing batch still ran, nothing after it did
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_lowest_index_error_wins() {
        let res = pool(4).install(|| {
            run_par(4, |i| {
                if i >= 1 { Err(i) } else { Ok(()) }
            })
        });
        assert_eq!(res, Err(1));
    }
}
