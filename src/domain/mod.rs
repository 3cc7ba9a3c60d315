mod ledger;
mod money;
mod movement;
mod user;

pub use ledger::*;
pub use money::*;
pub use movement::*;
pub use user::*;
