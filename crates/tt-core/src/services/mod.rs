//! Services - default implementations of the service ports.

mod post;

pub use post::DefaultPostService;
