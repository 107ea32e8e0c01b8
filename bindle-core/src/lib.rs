mod as_value;
mod binds;
mod config;
mod connection;
mod cursor;
mod driver;
mod error;
mod prepared;
mod registry;
mod result_set;
mod row;
mod schema;
mod session;
mod statement;
mod threaded;
mod type_map;
mod util;
mod value;

pub use ::anyhow::Context;
pub use ::indoc;
pub use as_value::*;
pub use binds::*;
pub use config::*;
pub use connection::*;
pub use cursor::*;
pub use driver::*;
pub use error::*;
pub use prepared::*;
pub use registry::*;
pub use result_set::*;
pub use row::*;
pub use schema::*;
pub use session::*;
pub use statement::*;
pub use threaded::*;
pub use type_map::*;
pub use util::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
