mod connection;
mod driver;
mod prepared;

pub use connection::*;
pub use driver::*;
pub use prepared::*;
