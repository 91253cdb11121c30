//! Classification of C macro bodies as integer, floating, character or
//! string literals.
//!
//! A [`MacroTable`] reads `#define` lines and records a [`Verdict`] for each
//! one, in file order. Bodies may combine literals with C operators, casts and
//! string concatenation, and may name earlier definitions.
//!
//! ```
//! use cmacrolit::{MacroTable, Reason, Verdict};
//!
//! let mut table = MacroTable::new();
//! table.load("#define SIZE (1 << 4)\n#define BAD 0b2\n");
//! assert_eq!(table.value("SIZE").and_then(|v| v.as_int()), Some(16));
//! assert_eq!(table.get("BAD"), Some(&Verdict::Invalid(Reason::MalformedDigit)));
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod literal;
pub mod parser;
pub mod source;
pub mod table;
pub mod value;

pub use config::{Config, WcharWidth};
pub use error::{Reason, TableError};
pub use eval::{Evaluator, Scope, classify, classify_with};
pub use table::{MacroEntry, MacroTable};
pub use value::{
    CChar, CharLiteral, Encoding, FloatLiteral, FloatPrecision, IntLiteral, IntWidth,
    LiteralValue, Radix, Signedness, StrLiteral, Verdict,
};
