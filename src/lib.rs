pub mod dpl;
pub mod logger;
