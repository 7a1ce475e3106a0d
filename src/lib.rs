pub mod clock;
pub mod control;
pub mod document;
pub mod error;
pub mod estimate;
pub mod gateway;
pub mod model;
pub mod pace;
pub mod session;
pub mod trace;
pub mod typo;
