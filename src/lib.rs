pub mod cancel;
pub mod cli;
pub mod config;
pub mod ctx;
pub mod error;
pub mod geneset;
pub mod io;
pub mod math;
pub mod matrix;
pub mod network;
pub mod pipeline;
pub mod schema;
