//! Entity CRUD routes. Each entity gets its own router, mounted under its path segment,
//! with the permissions injected for it baked into the router state.

use crate::handlers::entity::{create, delete as delete_handler, list, list_paginated, read, update};
use crate::permission::PermissionRegistry;
use crate::state::{AppState, EntityState};
use axum::{routing::get, Router};

/// Routes for one entity, relative to its mount point:
/// `GET /`, `POST /`, `GET /paginated`, `GET|PUT|PATCH|DELETE /:id`.
pub fn entity_router(state: EntityState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/paginated", get(list_paginated))
        .route(
            "/:id",
            get(read).put(update).patch(update).delete(delete_handler),
        )
        .with_state(state)
}

/// One router per entity in the model, each nested at `/{path_segment}`.
pub fn entity_routes(state: &AppState, permissions: &PermissionRegistry) -> Router {
    state.model.entities.iter().fold(Router::new(), |router, entity| {
        let entity_state = state.for_entity(entity, permissions.get(&entity.path_segment));
        tracing::debug!(entity = %entity.name, path = %entity.path_segment, "mounting entity router");
        router.nest(&format!("/{}", entity.path_segment), entity_router(entity_state))
    })
}
