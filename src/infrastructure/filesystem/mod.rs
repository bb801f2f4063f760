pub mod path_resolver;

pub use path_resolver::{content_type_for, PathResolver};
