pub mod broadcast;
pub mod promotion;
