//! Shared application state. One `EntityState` is built per mounted entity router.

use crate::config::{PaginationSettings, ResolvedEntity, ResolvedModel};
use crate::permission::Permissions;
use crate::service::CrudService;
use crate::store::EntityStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub model: Arc<ResolvedModel>,
    pub pagination: PaginationSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, model: ResolvedModel, pagination: PaginationSettings) -> Self {
        AppState {
            store,
            model: Arc::new(model),
            pagination,
        }
    }

    /// State for the router of `entity`, carrying the permissions injected for it.
    pub fn for_entity(&self, entity: &ResolvedEntity, permissions: Permissions) -> EntityState {
        EntityState {
            store: self.store.clone(),
            entity: Arc::new(entity.clone()),
            permissions,
            pagination: self.pagination,
        }
    }
}

#[derive(Clone)]
pub struct EntityState {
    pub store: Arc<dyn EntityStore>,
    pub entity: Arc<ResolvedEntity>,
    pub permissions: Permissions,
    pub pagination: PaginationSettings,
}

impl EntityState {
    pub fn service(&self) -> CrudService<'_> {
        CrudService::new(self.store.as_ref(), &self.entity)
    }
}
