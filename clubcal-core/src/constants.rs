/// Collection holding event records.
pub const EVENTS_COLLECTION: &str = "events";

/// Collection holding event-to-report associations.
pub const FILES_COLLECTION: &str = "files";

/// Blob prefix under which uploaded reports are stored.
pub const REPORTS_PREFIX: &str = "reports";

/// Shown when an event has no uploaded report.
pub const NO_REPORT_MESSAGE: &str = "No report available for this event.";
