//! Compensating rollback for multi-step provisioning
//!
//! Each successfully created sub-resource registers an undo step. On failure
//! the steps run in reverse creation order. A failing undo step is logged
//! and skipped; it never replaces the error that triggered the rollback.

use crate::error::{CloudError, Result};
use futures_util::future::BoxFuture;

type UndoStep<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<()>> + Send + 'a>;

/// Stack of undo steps for one provisioning sequence
pub struct Compensation<'a> {
    operation: String,
    steps: Vec<(String, UndoStep<'a>)>,
}

impl<'a> Compensation<'a> {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            steps: Vec::new(),
        }
    }

    /// Register the undo step for a sub-resource that now exists.
    pub fn push<F>(&mut self, label: impl Into<String>, undo: F)
    where
        F: FnOnce() -> BoxFuture<'a, Result<()>> + Send + 'a,
    {
        self.steps.push((label.into(), Box::new(undo)));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The sequence succeeded; forget every undo step.
    pub fn commit(mut self) {
        self.steps.clear();
    }

    /// Run every undo step, newest first. Returns the labels that failed.
    pub async fn rollback(mut self) -> Vec<String> {
        let mut failed = Vec::new();
        while let Some((label, undo)) = self.steps.pop() {
            tracing::info!("{}: rolling back {}", self.operation, label);
            if let Err(e) = undo().await {
                tracing::warn!(
                    "{}: rollback of {} failed, continuing: {}",
                    self.operation,
                    label,
                    e
                );
                failed.push(label);
            }
        }
        failed
    }

    /// Roll back and hand back the original error unchanged.
    pub async fn fail_with(self, error: CloudError) -> CloudError {
        tracing::warn!("{}: {}", self.operation, error);
        self.rollback().await;
        error
    }
}

impl Drop for Compensation<'_> {
    fn drop(&mut self) {
        if !self.steps.is_empty() {
            tracing::warn!(
                "{}: {} undo steps dropped without commit or rollback",
                self.operation,
                self.steps.len()
            );
        }
    }
}
