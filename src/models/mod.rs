pub mod common;
pub mod order;
pub mod pagination;
pub mod point;
pub mod product;
pub mod user;
pub mod verification;

pub use common::*;
pub use order::*;
pub use pagination::*;
pub use point::*;
pub use product::*;
pub use user::*;
pub use verification::*;
