pub mod code_generator;
pub mod jwt;
pub mod order_no;
pub mod password;
pub mod phone;

pub use code_generator::generate_six_digit_code;
pub use jwt::*;
pub use order_no::generate_unique_order_no;
pub use password::*;
pub use phone::*;
