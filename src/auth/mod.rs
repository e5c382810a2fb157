pub mod audit;
pub mod gate;
pub mod password;
pub mod token;

pub use self::gate::Principal;
