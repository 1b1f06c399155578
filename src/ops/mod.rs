pub mod reorder;
pub mod selection;
pub mod task_store;
