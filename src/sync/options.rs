use super::SyncResponse;
use crate::core::{QueryOptions, SyncError, SyncResult};

pub type SuccessCallback = Box<dyn FnOnce(SyncResponse) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(SyncError) + Send>;

/// Callbacks and query data for a callback-style sync.
///
/// Both callbacks are optional; a missing one swallows its outcome.
/// `deliver` consumes the options, so at most one callback ever runs.
#[derive(Default)]
pub struct SyncOptions {
    pub data: Option<QueryOptions>,
    success: Option<SuccessCallback>,
    error: Option<ErrorCallback>,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query data for collection reads.
    pub fn data(mut self, data: QueryOptions) -> Self {
        self.data = Some(data);
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(SyncResponse) + Send + 'static,
    {
        self.success = Some(Box::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(SyncError) + Send + 'static,
    {
        self.error = Some(Box::new(callback));
        self
    }

    /// Hand the outcome to the matching callback.
    pub fn deliver(self, result: SyncResult<SyncResponse>) {
        match result {
            Ok(response) => {
                if let Some(success) = self.success {
                    success(response);
                }
            }
            Err(err) => {
                if let Some(error) = self.error {
                    error(err);
                }
            }
        }
    }
}
