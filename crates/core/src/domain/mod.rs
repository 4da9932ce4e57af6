pub mod criterion;
pub mod filter;
pub mod slots;
pub mod vehicle;
