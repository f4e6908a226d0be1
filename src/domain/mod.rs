mod balance;
mod money;
mod statement;
mod user;

pub use balance::*;
pub use money::*;
pub use statement::*;
pub use user::*;
