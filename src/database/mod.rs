pub mod driver;
pub mod handle;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod verify;

pub use driver::{Connector, Document, DocumentDriver, DriverError, SchemeConnector};
pub use handle::{DatabaseHandle, PhysicalClient};
pub use manager::{ConnectionRegistry, DatabaseError};
pub use memory::MemoryConnector;
pub use postgres::PgConnector;
