//! Revision dispatch: selects the silicon-generation implementation of the
//! low-level fabric and core-complex operations at runtime.

pub mod generation;
pub mod registry;
pub mod xfer;

pub use generation::SiliconGeneration;
pub use registry::RevisionRegistry;
pub use xfer::{
    CcxXfer, ComponentLocationMap, DfXfer, DispatchError, NotSupported, OpResult, PieRasRegisters,
    XferSource,
};
