pub mod reconcile;
pub mod validate;
