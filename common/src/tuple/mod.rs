mod entry;
mod fields;
#[allow(clippy::module_inception)]
mod tuple;
mod value;

pub use entry::*;
pub use fields::*;
pub use tuple::*;
pub use value::*;
