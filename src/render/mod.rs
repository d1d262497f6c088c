//! Renders the model as C++ declarations and definitions. Output is a token stream
//! so that it can be printed plain, marked up or styled for a terminal.
pub mod code;
pub mod demangle;
pub mod renderer;
pub mod settings;

pub use code::*;
pub use demangle::*;
pub use renderer::*;
pub use settings::*;
