//! Lifecycle flows around model writes

use crate::database::Database;
use crate::events::ModelEvent;
use crate::model::Model;

/// Fire a `*ing` event. Returns false when a listener stopped the write.
pub(crate) async fn before<M: Model>(db: &Database, event: ModelEvent, model: &mut M) -> bool {
    match db.events().fire(event, model).await {
        Ok(()) => true,
        Err(e) if e.is_propagation_stopped() => {
            tracing::info!(model = M::table_name(), event = %event, reason = %e, "write cancelled by listener");
            false
        }
        Err(e) => {
            tracing::warn!(model = M::table_name(), event = %event, error = %e, "listener failed, write cancelled");
            false
        }
    }
}

/// Fire an after-write event. The write already happened, so errors are
/// only logged.
pub(crate) async fn after<M: Model>(db: &Database, event: ModelEvent, model: &mut M) {
    if let Err(e) = db.events().fire(event, model).await {
        tracing::warn!(model = M::table_name(), event = %event, error = %e, "listener failed after write");
    }
}
