//! # Override Extractor
//!
//! Tree-sitter based extraction of Python class declarations: class name, declared bases as
//! written, and the methods defined directly in the class body.
//!
//! ## Example
//!
//! ```no_run
//! use override_extractor::Extractor;
//!
//! let mut extractor = Extractor::new()?;
//! let declarations = extractor.extract_str(
//!     "class Dog(Animal):\n    def speak(self):\n        return 'Woof'\n",
//!     "pets.py",
//! )?;
//! assert_eq!(declarations[0].declared_bases, vec!["Animal"]);
//! # Ok::<(), override_extractor::ExtractError>(())
//! ```

mod ast_analyzer;
mod error;
mod extractor;
mod language;
mod types;

pub use error::{ExtractError, Result};
pub use extractor::Extractor;
pub use language::{is_source_path, Language};
pub use types::{Declaration, MethodDecl};
