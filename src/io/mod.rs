pub mod config_io;
pub mod kv;
pub mod persistence;
pub mod recovery;
