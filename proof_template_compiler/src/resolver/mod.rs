pub mod base_resolver;
