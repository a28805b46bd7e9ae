mod admin;
mod answers;
mod categories;
mod health;
mod members;
mod questions;

pub use admin::admin_routes;
pub use answers::answer_routes;
pub use categories::category_routes;
pub use health::health_routes;
pub use members::member_routes;
pub use questions::question_routes;
