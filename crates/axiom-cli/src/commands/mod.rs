pub mod history;
pub mod solve;
