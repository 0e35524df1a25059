//! CrudService: generic CRUD over an entity store, plus the input schema set.

mod crud;
mod schema;
mod validation;
pub use crud::CrudService;
pub use schema::{parse_id, project_row, CreateInput, Fields, UpdateInput};
pub use validation::RequestValidator;
