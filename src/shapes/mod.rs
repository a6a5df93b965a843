//! Shapes: the typed object graph over a part's shape tree.
//!
//! [`ShapeCollection`] walks the `p:spTree` children and asks the factory
//! to materialize each one as a [`Shape`]. Shapes are views; they hold a
//! node handle and re-read the tree on every access.

mod base;
mod build;
mod collection;
mod factory;
mod placeholder;

pub use base::{PlaceholderFlavor, PlaceholderFormat, Shape, ShapeKind};
pub use collection::ShapeCollection;
pub use factory::make_shape;
pub use placeholder::EffectiveAttr;
