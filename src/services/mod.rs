pub mod executor;
pub mod extractor;
pub mod flow_log;
pub mod injector;
pub mod logger;
pub mod normalizer;
pub mod recipe_source;
