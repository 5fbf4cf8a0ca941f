pub mod sync;
pub mod validate;
