pub mod order_status_histories;
pub mod orders;
pub mod point_transactions;
pub mod products;
pub mod users;

pub use order_status_histories as order_status_history_entity;
pub use orders as order_entity;
pub use orders::OrderStatus;
pub use point_transactions as point_transaction_entity;
pub use products as product_entity;
pub use users as user_entity;
pub use users::UserRole;
