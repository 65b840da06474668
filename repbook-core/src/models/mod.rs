mod exercise;
mod set;
mod user;
mod workout;

pub use exercise::Exercise;
pub use set::Set;
pub use user::User;
pub use workout::Workout;
