pub mod bits;
pub mod cipher;
pub mod codec;
pub mod huffman;
pub mod keys;
pub mod modular;

pub use bits::*;
pub use cipher::*;
pub use codec::*;
pub use huffman::*;
pub use keys::*;
pub use modular::*;
