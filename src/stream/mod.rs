pub mod part;
pub mod rechunk;

pub use self::{part::Parts, rechunk::Rechunker};
