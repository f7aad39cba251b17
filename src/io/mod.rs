pub mod exporter;
pub mod json_writer;
pub mod matrix_reader;
pub mod summary;
pub mod tables;
