//! Progress reporting for long-running reconstruction passes.
//!
//! ```ignore
//! use meshbuild_reconstruction::progress::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//! let pivoting = BallPivoting::new(&cloud, config)?.with_progress(progress);
//! ```

/// A progress callback invoked as a pass works through its iterations.
///
/// The callback receives the current iteration, the iteration cap of the pass
/// and a short description of what is happening.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// A reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_forwards_to_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, message| {
            sink.lock().unwrap().push((current, total, message.to_string()));
        });

        progress.report(3, 10, "Expanding seed");
        assert_eq!(*seen.lock().unwrap(), vec![(3, 10, "Expanding seed".to_string())]);
    }

    #[test]
    fn test_none_is_silent() {
        Progress::none().report(1, 2, "ignored");
        assert_eq!(format!("{:?}", Progress::default()), "Progress { .. }");
    }
}
