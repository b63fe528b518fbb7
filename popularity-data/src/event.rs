//! Change events stored as JSON files.

use camino::Utf8Path;
use log::debug;
use popularity_core::ChangeEvent;

use crate::{SnapshotError, fs};

/// Read a change event from `path`.
///
/// The file holds the event's document `path`, an optional `eventId`, and
/// the `before` and `after` states, either of which may be `null`:
///
/// ```json
/// {"path": "Suggestions/a", "before": null, "after": {"likes": {"integerValue": 1}}}
/// ```
///
/// # Errors
/// Returns [`SnapshotError::Read`] when the file cannot be read and
/// [`SnapshotError::Parse`] when it is not a valid event.
pub fn load_change_event(path: &Utf8Path) -> Result<ChangeEvent, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let event: ChangeEvent = crate::parse_json(&raw, path)?;
    debug!(
        "loaded {:?} of {} from {path}",
        event.change.kind(),
        event.path
    );
    Ok(event)
}
