//! cnf-norm converts context-free grammars into Chomsky Normal Form.
//!
//! A grammar is built programmatically, parsed from line-based text, or
//! loaded from a JSON description, then rewritten in place by a four-stage
//! pipeline: start-symbol isolation, epsilon elimination, unit-production
//! elimination, and binarization with terminal isolation. Every stage
//! preserves the generated language exactly; afterwards each production is
//! either two variables or a single terminal, with `ε` allowed only on the
//! start variable.
//!
//! # Example
//!
//! ```rust
//! use cnf_norm::{GrammarBuilder, cnf_violations, to_cnf};
//!
//! let mut grammar = GrammarBuilder::new("S")
//!     .rule("S", &["a S b", "ε"])
//!     .build()
//!     .unwrap();
//!
//! to_cnf(&mut grammar);
//! assert!(cnf_violations(&grammar).is_empty());
//! ```

pub mod grammar;
pub mod language;
pub mod normalize;
pub mod schema;
pub mod utils;

pub use grammar::{Grammar, GrammarBuilder, Production, Symbol};
pub use normalize::{FreshNames, cnf_violations, to_cnf};
pub use schema::GrammarSchema;
pub use utils::{GrammarError, Result};
