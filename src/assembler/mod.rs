//! The Assembler module is in charge of taking Orn mnemonic
//! text and producing a loadable bytecode image.
//!
//! The pipeline is: scan the text into tokens, emit the packed
//! image with placeholder jump operands, resolve and patch every
//! recorded jump, point the synthesized entry jump at `main`, then
//! compact the buffer. The persisted artifact is the image XORed
//! with a fixed mask.

pub mod buffer;
pub mod emitter;
pub mod error;
pub mod isa;
pub mod manager;
pub mod scanner;
pub mod tables;

pub use error::AsmError;
pub use manager::{assemble, Manager};
