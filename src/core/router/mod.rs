pub mod path;
#[allow(clippy::module_inception)]
pub mod router;
