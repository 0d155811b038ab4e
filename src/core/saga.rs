//! Step tracking for the add/remove workflows.
//!
//! The catalog file, the page file, the asset directory and the git
//! repository are mutated one after another with no shared transaction. A
//! [`Saga`] runs those steps in order and, when one fails, records exactly
//! which stores were already changed. Nothing is rolled back.

use crate::errors::Result;
use std::fmt;
use std::future::Future;
use tracing::{debug, error, warn};

/// One mutation of one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    WriteAsset,
    SaveCatalog,
    WritePage,
    DeleteAssets,
    Publish,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WriteAsset => "write asset",
            Self::SaveCatalog => "save catalog",
            Self::WritePage => "write page",
            Self::DeleteAssets => "delete assets",
            Self::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Ordered record of the steps an operation has completed.
#[derive(Debug)]
pub struct Saga {
    operation: &'static str,
    subject: String,
    completed: Vec<Step>,
}

impl Saga {
    #[must_use]
    pub fn new(operation: &'static str, subject: impl Into<String>) -> Self {
        Self {
            operation,
            subject: subject.into(),
            completed: Vec::new(),
        }
    }

    /// Runs `action` as `step`, recording it on success.
    ///
    /// On failure the error is returned unchanged after logging whether the
    /// operation failed cleanly or left earlier steps applied.
    pub async fn step<T, F>(&mut self, step: Step, action: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match action.await {
            Ok(value) => {
                debug!(operation = self.operation, subject = %self.subject, %step, "step done");
                self.completed.push(step);
                Ok(value)
            }
            Err(e) => {
                if self.completed.is_empty() {
                    warn!(
                        operation = self.operation,
                        subject = %self.subject,
                        %step,
                        "failed before changing anything: {e}"
                    );
                } else {
                    error!(
                        operation = self.operation,
                        subject = %self.subject,
                        %step,
                        completed = ?self.completed,
                        "failed after partial changes, stores are now inconsistent: {e}"
                    );
                }
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn completed(&self) -> &[Step] {
        &self.completed
    }
}
