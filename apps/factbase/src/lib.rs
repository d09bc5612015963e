//! # factbase
//!
//! Command-line front end for `factbase-core`. The binary in `main.rs` only
//! sets up logging and hands the parsed arguments to [`cli::execute`].

pub mod cli;
