//! Testing utilities and headless host for Preactive

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
