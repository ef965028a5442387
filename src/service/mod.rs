//! Entity runtime: records and the generic CRUD service.

mod crud;
mod record;
pub use crud::CrudService;
pub use record::Record;
