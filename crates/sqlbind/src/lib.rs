//! # sqlbind
//!
//! Dialect-aware INSERT/REPLACE construction and row-to-struct binding.
//!
//! ## Features
//!
//! - **One entry point for every input shape**: a record, a slice of records,
//!   a column → value map or a list of maps all normalize to the same statement
//! - **Dialect aware**: identifier quoting and placeholder style come from a [`Dialect`]
//! - **Typed scanning**: rows bind into `#[derive(Record)]` structs through a fixed
//!   conversion matrix, or into untyped maps
//! - **No global state**: tag name, dialect and time layout live in [`Config`]
//!
//! ## Building statements
//!
//! ```ignore
//! use sqlbind::{Input, Normalizer, Record, dialect::POSTGRES};
//!
//! #[derive(Default, Record)]
//! pub struct User {
//!     #[db(column = "username")]
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! let normalizer = Normalizer::default();
//! let users = [User { name: "a".into(), age: 18 }, User { name: "b".into(), age: 19 }];
//! let stmt = sqlbind::insert(POSTGRES, &normalizer, "user", Input::records(&users))?;
//! assert_eq!(
//!     stmt.sql,
//!     r#"INSERT INTO "user" ("username", "age") VALUES ($1, $2), ($3, $4)"#
//! );
//! ```
//!
//! ## Scanning rows
//!
//! ```ignore
//! use sqlbind::{Scanner, postgres::PgRowCursor};
//!
//! let rows = client.query("SELECT username, age FROM \"user\"", &[]).await?;
//! let users: Vec<User> = Scanner::default().scan_all(&mut PgRowCursor::new(rows))?;
//! ```

pub mod builder;
pub mod config;
pub mod dialect;
pub mod error;
pub mod input;
pub mod record;
pub mod scan;
pub mod value;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use builder::{Arg, InsertBuilder, InsertMode, SqlBuilder, Statement, insert, raw, replace};
pub use config::Config;
pub use dialect::{Dialect, DialectSpec};
pub use error::{BindError, BindResult, BoxError};
pub use input::{Input, Normalizer, RowSet};
pub use record::{FieldArg, FieldDescriptor, FieldKind, Record, RecordArgs};
pub use scan::{
    AcceptValue, BindContext, Bindable, RowCursor, Scanner, UnmarshalBytes, VecCursor,
    accept_into, accept_option, unmarshal_into, unmarshal_option,
};
pub use value::{JsonTime, ToValue, Value, ValueMap};

#[cfg(feature = "derive")]
pub use sqlbind_derive::Record;

#[cfg(feature = "postgres")]
pub use postgres::PgRowCursor;
