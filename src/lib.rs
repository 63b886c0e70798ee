//! Formula-driven batch file renaming.
//!
//! A rename formula is an infix expression over integers, strings, padding
//! markers and per-file variables. It is compiled once to reverse Polish
//! notation, then bound and evaluated for every file in a batch to produce
//! that file's new name. The [`BatchExecutor`] runs batches on a background
//! thread, one at a time, so a front end can keep polling for the result.
//!
//! # Example
//!
//! ```rust
//! use rename_expr::*;
//!
//! let formula = Expression::parse(r#""IMG_" + $index * #4"#).unwrap();
//! let rpn = formula.compile().unwrap();
//!
//! let bound = bind(&rpn, 7, "/photos/DSC1234.jpg").unwrap();
//! assert_eq!(evaluate(&bound).unwrap(), "IMG_0007");
//! ```

mod batch;
mod bind;
mod compile;
pub mod config;
mod dispatch;
mod error;
mod evaluate;
mod executor;
mod expression;
pub mod fs;
mod parse;
mod value;

/// Uses the [`pest`] parsing expression grammar language.
///
/// ```text
#[doc = include_str!("grammar.pest")]
/// ```
pub mod grammar_doc {}

pub use batch::{apply_batch, plan_batch, run_batch, BatchOutcome, RenamePlan};
pub use bind::{bind, directory_prefix, file_name};
pub use compile::compile;
pub use config::RenamerConfig;
pub use dispatch::{warmup_operator_tables, MAX_FORMAT_WIDTH};
pub use error::*;
pub use evaluate::evaluate;
pub use executor::{BatchExecutor, ExecutorState};
pub use expression::Expression;
pub use fs::{FileSystem, LocalFileSystem};
pub use parse::ParseError;
pub use value::*;
