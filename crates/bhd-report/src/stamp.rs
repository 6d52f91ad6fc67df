//! Last-updated stamping of published artifacts.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

/// Newest of the given source modification times.
pub fn last_updated<I>(times: I) -> Option<SystemTime>
where
    I: IntoIterator<Item = Option<SystemTime>>,
{
    times.into_iter().flatten().max()
}

/// Set the modification time of every path to `time`.
///
/// Returns the number of paths stamped. Failures are logged and skipped.
pub fn stamp_last_updated(paths: &[PathBuf], time: SystemTime) -> usize {
    let mut stamped = 0;
    for path in paths {
        match set_modified(path, time) {
            Ok(()) => stamped += 1,
            Err(err) => warn!(path = %path.display(), error = %err, "last-updated stamp failed"),
        }
    }
    debug!(stamped, "artifacts stamped");
    stamped
}

fn set_modified(path: &Path, time: SystemTime) -> std::io::Result<()> {
    File::open(path)?.set_modified(time)
}
