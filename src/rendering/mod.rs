pub mod external;

pub use external::CommandTransform;
