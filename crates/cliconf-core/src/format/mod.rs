//! INI-style text format.
//!
//! The parser yields a [`ConfigNode`] of typed scalars and one level of
//! `[section]` mappings; the writer serializes the same shape back to text.
//!
//! ```ini
//! name = "app"
//! debug = true
//!
//! [db]
//! host = "localhost"
//! port = 5432
//! ```

pub mod errors;
pub mod parser;
pub mod types;
pub mod writer;

pub use errors::FormatError;
pub use parser::parse;
pub use types::{ConfigNode, ConfigValue, Scalar};
pub use writer::serialize;
