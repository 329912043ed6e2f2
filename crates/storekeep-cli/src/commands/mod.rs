pub mod consume;
pub mod inspect;
pub mod migrate;
