pub mod backends;
pub mod search;
pub mod widgets;
