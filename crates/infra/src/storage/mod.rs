//! Persistent [`KeyValueStorage`](feedwire_common::KeyValueStorage) backends.

pub mod json_file;

pub use json_file::JsonFileStorage;
