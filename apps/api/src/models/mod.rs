pub mod interview;
pub mod outline;
