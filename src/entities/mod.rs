// Entity snapshots as delivered by the game backend.
// The backend is authoritative; nothing here mutates game state.

pub mod plot;
pub mod business;
pub mod user;

pub use plot::{Plot, PlotIndex, PlotStatus};
pub use business::{Business, BusinessType};
pub use user::User;
