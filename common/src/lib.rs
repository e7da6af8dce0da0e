pub mod error;
pub mod tuple;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::tuple::*;
}
