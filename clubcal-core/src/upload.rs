//! Transient state of the "upload report" dialog.
//!
//! The upload itself is run by [`crate::planner::Planner::upload_report`]:
//! blob write, URL lookup, association insert, in that order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::event::Event;
use crate::file::LocalFile;

/// The event a report is being attached to, and the chosen file.
#[derive(Debug, Default)]
pub struct ReportUpload {
    selected: Option<Event>,
    file: Option<LocalFile>,
    in_flight: Arc<AtomicBool>,
}

impl ReportUpload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_event(&mut self, event: Event) {
        self.selected = Some(event);
    }

    pub fn choose_file(&mut self, file: LocalFile) {
        self.file = Some(file);
    }

    /// Close the dialog without uploading.
    pub fn cancel(&mut self) {
        self.selected = None;
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.selected.as_ref()
    }

    pub fn file(&self) -> Option<&LocalFile> {
        self.file.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// A handle views can poll while the upload future is pending.
    pub fn status(&self) -> UploadStatus {
        UploadStatus(Arc::clone(&self.in_flight))
    }

    /// Mark an upload as started, or `None` if one is already running.
    pub(crate) fn begin(&self) -> Option<InFlight> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight(Arc::clone(&self.in_flight)))
    }

    pub(crate) fn finish(&mut self) {
        self.selected = None;
        self.file = None;
    }
}

/// Read-only view of the in-flight flag.
#[derive(Debug, Clone)]
pub struct UploadStatus(Arc<AtomicBool>);

impl UploadStatus {
    pub fn is_uploading(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Clears the in-flight flag when dropped, whatever the upload's result.
pub(crate) struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
