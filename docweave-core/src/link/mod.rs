//! Symbol link parsing, disambiguation and resolution.

pub mod absolute;
pub mod completion;
pub mod component;
pub mod disambiguation;
pub mod hash;
pub mod index;
pub mod kind;

pub use absolute::AbsoluteSymbolLink;
pub use component::{DisambiguationSuffix, LinkComponent};
pub use disambiguation::{ContainerOptions, Disambiguation, DisambiguationContainer, SymbolMetadata};
pub use index::{IndexedSymbol, SymbolId, SymbolIndex};
