//! Handlers for the subcommands, e.g. `render` or `sections`. Each writes to the
//! supplied writer so that output can be checked in tests.
pub mod debug;
pub mod elf;
pub mod info;
pub mod misc;
pub mod tables;

pub use debug::*;
pub use elf::*;
pub use info::*;
pub use misc::*;
