//! Derived structure for client-SDK generators: the sub-client hierarchy of a
//! service description, and plain values from typed default/constant values.
pub mod semantic;
pub mod lower;
pub mod clients;
pub mod hierarchy;
pub mod normalize;
pub mod path_de;

pub use clients::{BuildError, Client, ClientId, ClientTree, PromotionRule};
pub use hierarchy::HierarchyError;
pub use normalize::{get_value_type_value, property_defaults, NormalizedValue, ValueError};
pub use semantic::{
    Container, ContainerId, ContainerKind, EnumMember, EnumValue, ModelDecl, Numeric,
    PropertyDecl, SemanticGraph, TypedValue,
};
