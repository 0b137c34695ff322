pub mod collect;
pub mod history;
pub mod objects;
pub mod status;
