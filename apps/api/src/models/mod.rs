pub mod practice;
pub mod process;
