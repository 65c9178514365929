//! Request handlers.

pub mod ask;
pub mod health;
pub mod pages;
pub mod upload;

pub use ask::*;
pub use health::*;
pub use pages::*;
pub use upload::*;
