pub mod command;
pub mod ingredient;
pub mod mode;
pub mod order;
pub mod results;
pub mod sampler;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod store;

use std::time::{SystemTime, UNIX_EPOCH};

pub use ingredient::{Ingredient, CATALOG};
pub use mode::GameMode;
pub use order::{Order, OrderId};
pub use session::{GameConfig, Session, SessionEvent, Status};
pub use store::{AddOutcome, OrderStore, Rejection};

// Unix time in milliseconds
pub type Millis = u64;

pub fn now_millis() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backward.")
        .as_millis() as Millis
}
