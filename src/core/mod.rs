pub mod error;
pub mod types;

pub use error::{CvError, FieldError, Result, ValidationErrors};
pub use types::{Language, Translatable};
