pub mod connection_pool;
pub mod schema;

pub use connection_pool::connect;
pub use schema::initialize_schema;
