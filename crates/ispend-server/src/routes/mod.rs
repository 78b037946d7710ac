//! API routes.

pub mod health;
pub mod spending;
pub mod users;

pub use health::{HealthResponse, health_routes};
pub use spending::{
    NewSpendingForm, default_spend_kinds_handler, delete_spending_handler, get_spending_handler,
    list_spends_handler, new_spending_handler, spend_kinds_handler,
};
pub use users::{
    LoginForm, NewUserForm, SessionForm, UsernameQuery, check_session_handler, get_user_handler,
    list_users_handler, login_handler, logout_handler, me_handler, register_handler,
};
