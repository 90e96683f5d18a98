use crate::common::{AlwaysPrimary, CcxRoles, FabricAccess, MsrAccess};
use crate::dispatch::XferSource;

/// Capabilities one boot pass runs with
///
/// Every initialization entry point takes the context explicitly; there is no
/// global transport or diagnostics handle.
#[derive(Clone, Copy)]
pub struct SilContext<'a> {
    pub xfer: &'a dyn XferSource,
    pub fabric: &'a dyn FabricAccess,
    pub msr: &'a dyn MsrAccess,
    pub roles: &'a dyn CcxRoles,
}

impl<'a> SilContext<'a> {
    pub fn new(
        xfer: &'a dyn XferSource,
        fabric: &'a dyn FabricAccess,
        msr: &'a dyn MsrAccess,
    ) -> Self {
        Self {
            xfer,
            fabric,
            msr,
            roles: &AlwaysPrimary,
        }
    }

    pub fn with_roles(self, roles: &'a dyn CcxRoles) -> Self {
        Self { roles, ..self }
    }
}
