pub mod home;
pub mod resolver;

pub use home::resolve_home;
pub use resolver::{PathResolver, Resolution};
