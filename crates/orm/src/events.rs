//! Model lifecycle events and the observer trait

use std::fmt;

use async_trait::async_trait;

use crate::event_error::EventError;
use crate::model::Model;

/// Lifecycle points at which hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEvent {
    Saving,
    Creating,
    Created,
    Updating,
    Updated,
    Saved,
    Deleting,
    Deleted,
}

impl ModelEvent {
    /// `*ing` events run before the write and can abort it
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            ModelEvent::Saving | ModelEvent::Creating | ModelEvent::Updating | ModelEvent::Deleting
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::Saving => "saving",
            ModelEvent::Creating => "creating",
            ModelEvent::Created => "created",
            ModelEvent::Updating => "updating",
            ModelEvent::Updated => "updated",
            ModelEvent::Saved => "saved",
            ModelEvent::Deleting => "deleting",
            ModelEvent::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ModelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives every lifecycle event of one model type. All hooks default to
/// doing nothing; returning an error from a `*ing` hook aborts the write.
#[async_trait]
pub trait ModelObserver<M: Model>: Send + Sync {
    async fn saving(&self, _model: &mut M) -> Result<(), EventError> {
        Ok(())
    }

    async fn creating(&self, _model: &mut M) -> Result<(), EventError> {
        Ok(())
    }

    async fn created(&self, _model: &M) -> Result<(), EventError> {
        Ok(())
    }

    async fn updating(&self, _model: &mut M) -> Result<(), EventError> {
        Ok(())
    }

    async fn updated(&self, _model: &M) -> Result<(), EventError> {
        Ok(())
    }

    async fn saved(&self, _model: &M) -> Result<(), EventError> {
        Ok(())
    }

    async fn deleting(&self, _model: &mut M) -> Result<(), EventError> {
        Ok(())
    }

    async fn deleted(&self, _model: &M) -> Result<(), EventError> {
        Ok(())
    }
}

/// Route one event to the matching observer hook
pub(crate) async fn dispatch<M: Model>(
    observer: &dyn ModelObserver<M>,
    event: ModelEvent,
    model: &mut M,
) -> Result<(), EventError> {
    match event {
        ModelEvent::Saving => observer.saving(model).await,
        ModelEvent::Creating => observer.creating(model).await,
        ModelEvent::Created => observer.created(model).await,
        ModelEvent::Updating => observer.updating(model).await,
        ModelEvent::Updated => observer.updated(model).await,
        ModelEvent::Saved => observer.saved(model).await,
        ModelEvent::Deleting => observer.deleting(model).await,
        ModelEvent::Deleted => observer.deleted(model).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_events() {
        let before: Vec<_> = [
            ModelEvent::Saving,
            ModelEvent::Creating,
            ModelEvent::Created,
            ModelEvent::Updating,
            ModelEvent::Updated,
            ModelEvent::Saved,
            ModelEvent::Deleting,
            ModelEvent::Deleted,
        ]
        .into_iter()
        .filter(ModelEvent::is_before)
        .map(|e| e.to_string())
        .collect();
        assert_eq!(before, vec!["saving", "creating", "updating", "deleting"]);
    }
}
