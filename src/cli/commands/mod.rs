pub mod domains;
pub mod schema;
pub mod tenant;
