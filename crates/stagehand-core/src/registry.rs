//! Implementation registry.
//!
//! Discovery is explicit: app implementations are registered per
//! `(app, infra, flavor)` tuple and infrastructure implementations per
//! type name. The registry is read-only after construction.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::app::{App, AppFactory, Tuple};
use crate::infra::{Infra, InfraFactory};

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("app implementation for tuple not found: {0}")]
    UnknownAppTuple(Tuple),
    #[error("app implementation failed to start: {0}")]
    AppStartFailed(anyhow::Error),
    #[error("infrastructure type not supported: {0}")]
    UnknownInfraType(String),
    #[error("infrastructure implementation failed to start: {0}")]
    InfraStartFailed(anyhow::Error),
}

/// Resolves appfile tuples to app factories and infrastructure types to
/// infra factories.
#[derive(Default)]
pub struct Registry {
    apps: HashMap<Tuple, Arc<dyn AppFactory>>,
    infras: HashMap<String, Arc<dyn InfraFactory>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an app implementation for a tuple (construction time only).
    pub fn register_app(&mut self, tuple: Tuple, factory: Arc<dyn AppFactory>) {
        self.apps.insert(tuple, factory);
    }

    /// Register an infrastructure implementation for a type name
    /// (construction time only).
    pub fn register_infra(&mut self, kind: impl Into<String>, factory: Arc<dyn InfraFactory>) {
        self.infras.insert(kind.into(), factory);
    }

    /// Start the app implementation registered for `tuple`.
    pub fn resolve_app(&self, tuple: &Tuple) -> Result<Arc<dyn App>, RegistryError> {
        let factory = self
            .apps
            .get(tuple)
            .ok_or_else(|| RegistryError::UnknownAppTuple(tuple.clone()))?;
        factory.build().map_err(RegistryError::AppStartFailed)
    }

    /// Start the infrastructure implementation registered for `kind`.
    pub fn resolve_infra(&self, kind: &str) -> Result<Arc<dyn Infra>, RegistryError> {
        let factory = self
            .infras
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownInfraType(kind.to_string()))?;
        factory.build().map_err(RegistryError::InfraStartFailed)
    }

    /// All registered app tuples.
    pub fn app_tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.apps.keys()
    }

    /// All registered infrastructure types.
    pub fn infra_types(&self) -> impl Iterator<Item = &str> {
        self.infras.keys().map(String::as_str)
    }
}
