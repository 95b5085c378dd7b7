pub mod types;
pub mod config;
pub mod preprocess;
pub mod grouping;
pub mod tree;
pub mod template;
pub mod postprocess;
pub mod quality;
pub mod brain;

mod intern;
