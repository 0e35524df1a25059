//! Generic CRUD scaffolding over PostgreSQL: entities declared in a JSON document get
//! list, paginated list, get, create, update and delete endpoints with permission hooks.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod pagination;
pub mod permission;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use app::build_app;
pub use config::{load_from_path, resolve, EntityDocument, HttpSettings, PaginationSettings, ResolvedEntity, ResolvedModel, Settings};
pub use error::{AppError, ConfigError, FieldError};
pub use extractors::{Identity, RequestContext};
pub use pagination::{Page, PageRequest};
pub use permission::{PermissionRegistry, Permissions};
pub use routes::{common_routes, entity_router, entity_routes};
pub use service::CrudService;
pub use state::{AppState, EntityState};
pub use store::{EntityStore, PgStore};
