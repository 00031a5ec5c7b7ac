//! Structural entity types

mod frame;
mod material;
mod node;
mod section;
mod support;

pub use frame::{Element, ElementKind, EndReleases, Releases};
pub use material::Material;
pub use node::Node;
pub use section::Section;
pub use support::BoundaryCondition;
