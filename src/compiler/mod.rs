//! Per-file compilers behind the pipelines.
//!
//! - `include`: markup include expansion
//! - `style`: Sass → prefixed CSS
//! - `script`: ES module bundling

pub mod include;
pub mod script;
pub mod style;
