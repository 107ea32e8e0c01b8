pub use bindle_core::*;
