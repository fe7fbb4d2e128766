//! Per-database registry of lifecycle listeners, keyed by model type

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;

use crate::event_error::EventError;
use crate::events::{dispatch, ModelEvent, ModelObserver};
use crate::model::Model;

type Callback<M> = Arc<dyn Fn(&mut M) -> Result<(), EventError> + Send + Sync>;

enum Listener<M: Model> {
    Observer(Arc<dyn ModelObserver<M>>),
    Callback(ModelEvent, Callback<M>),
}

impl<M: Model> Clone for Listener<M> {
    fn clone(&self) -> Self {
        match self {
            Listener::Observer(observer) => Listener::Observer(Arc::clone(observer)),
            Listener::Callback(event, callback) => Listener::Callback(*event, Arc::clone(callback)),
        }
    }
}

/// Listeners for one model type, run in registration order
pub struct ObserverRegistry<M: Model> {
    listeners: Vec<Listener<M>>,
}

impl<M: Model> Clone for ObserverRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<M: Model> Default for ObserverRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> ObserverRegistry<M> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn observe(&mut self, observer: Arc<dyn ModelObserver<M>>) {
        self.listeners.push(Listener::Observer(observer));
    }

    pub fn on(&mut self, event: ModelEvent, callback: Callback<M>) {
        self.listeners.push(Listener::Callback(event, callback));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Run every listener for `event`; the first error stops the chain
    pub async fn trigger(&self, event: ModelEvent, model: &mut M) -> Result<(), EventError> {
        for listener in &self.listeners {
            match listener {
                Listener::Observer(observer) => dispatch(observer.as_ref(), event, model).await?,
                Listener::Callback(on, callback) if *on == event => callback(&mut *model)?,
                Listener::Callback(..) => {}
            }
        }
        Ok(())
    }
}

/// Holds an `ObserverRegistry<M>` for every model type that has listeners
#[derive(Default)]
pub struct EventRegistry {
    registries: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_registry<M: Model>(&self, f: impl FnOnce(&mut ObserverRegistry<M>)) {
        let mut entry = self
            .registries
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(ObserverRegistry::<M>::new()));
        if let Some(registry) = entry.downcast_mut::<ObserverRegistry<M>>() {
            f(registry);
        }
    }

    pub fn on<M, F>(&self, event: ModelEvent, callback: F)
    where
        M: Model,
        F: Fn(&mut M) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.with_registry::<M>(|registry| registry.on(event, Arc::new(callback)));
    }

    pub fn observe<M, O>(&self, observer: O)
    where
        M: Model,
        O: ModelObserver<M> + 'static,
    {
        self.with_registry::<M>(|registry| registry.observe(Arc::new(observer)));
    }

    pub fn has_listeners_for<M: Model>(&self) -> bool {
        self.registry_for::<M>().is_some_and(|r| !r.is_empty())
    }

    /// Snapshot of the listeners for `M`, safe to hold across awaits
    pub fn registry_for<M: Model>(&self) -> Option<ObserverRegistry<M>> {
        self.registries
            .get(&TypeId::of::<M>())?
            .downcast_ref::<ObserverRegistry<M>>()
            .cloned()
    }

    /// Drop every listener for `M`
    pub fn clear<M: Model>(&self) {
        self.registries.remove(&TypeId::of::<M>());
    }

    /// Fire `event` for `model`
    pub async fn fire<M: Model>(&self, event: ModelEvent, model: &mut M) -> Result<(), EventError> {
        match self.registry_for::<M>() {
            Some(registry) => registry.trigger(event, model).await,
            None => Ok(()),
        }
    }
}
