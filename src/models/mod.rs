pub mod document;
pub mod register;
pub mod request;
pub mod style;

pub use document::*;
pub use register::*;
pub use request::*;
pub use style::*;
