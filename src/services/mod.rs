pub mod auth_service;
pub mod order_service;
pub mod order_verification_service;
pub mod point_ledger_service;
pub mod product_service;
pub mod status_history_service;
pub mod verification_code_service;

pub use auth_service::*;
pub use order_service::*;
pub use order_verification_service::OrderVerificationService;
pub use point_ledger_service::*;
pub use product_service::*;
pub use status_history_service::*;
pub use verification_code_service::*;
