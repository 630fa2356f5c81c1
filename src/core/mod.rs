pub mod assemble;
pub mod binding;
pub mod identifier;
pub mod interface;
pub mod proxy;
pub mod reference;
pub mod registry;
pub mod task;
pub mod trace;
pub mod types;
pub mod validation;
