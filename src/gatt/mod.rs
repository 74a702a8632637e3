//! GATT attribute tree: declaration, access contract and registration.

pub mod access;
pub mod registry;
pub mod tree;
pub mod uuid;

pub use access::{access, AccessOp, CccdFlags, AccessOutcome, AttributeValue};
pub use registry::{
    register_tree, AttributeRegistrar, CharacteristicHandles, CharacteristicInit, Registration,
    ServiceHandles,
};
pub use tree::{AccessContract, CharacteristicDef, Properties, ServiceDef, ATTRIBUTE_TREE};
