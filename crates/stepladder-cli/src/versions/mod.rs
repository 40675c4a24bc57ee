//! The application's migration steps, one module per version.

mod m001_create_users_table;
mod m002_add_user_indexes;
mod m003_seed_admin_user;

pub use m001_create_users_table::create_users_table;
pub use m002_add_user_indexes::add_user_indexes;
pub use m003_seed_admin_user::{ADMIN_EMAIL, seed_admin_user};
