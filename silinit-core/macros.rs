//! Declarative macros to reduce boilerplate across the silinit codebase

/// Define an enum with name() and all() methods, plus custom data per variant
///
/// # Example
/// ```
/// use silinit::enum_with_data;
///
/// enum_with_data! {
///     pub enum Block: u32 {
///         Df => ("DF", 0x18),
///         Ccx => ("CCX", 0x00),
///     }
///     impl pci_device -> u32
/// }
///
/// let block = Block::Df;
/// assert_eq!(block.name(), "DF");
/// assert_eq!(block.pci_device(), 0x18);
/// ```
#[macro_export]
macro_rules! enum_with_data {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $data_type:ty {
            $($variant:ident => ($str:literal, $data:expr)),* $(,)?
        }
        impl $method:ident -> $return_type:ty
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }

            pub fn $method(&self) -> $return_type {
                match self {
                    $($name::$variant => $data,)*
                }
            }

            pub fn all() -> Vec<$name> {
                vec![$($name::$variant,)*]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

/// Resolve an operation table from a context, logging and bailing out on failure
///
/// The table is resolved on every expansion; nothing is cached.
///
/// # Example
/// ```ignore
/// // In ccx::ccx_enable_smee()
/// let table = resolve_xfer!(ctx, ccx_xfer, "ccx_enable_smee", return Outcome::Unavailable);
/// ```
#[macro_export]
macro_rules! resolve_xfer {
    ($ctx:expr, $getter:ident, $op:literal, $on_err:expr) => {
        match $ctx.xfer.$getter() {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(concat!($op, ": operation table unavailable: {}"), e);
                $on_err
            }
        }
    };
}

/// Unwrap an operation slot, treating `NotSupported` as "skip"
///
/// # Example
/// ```ignore
/// let list = slot_or!(table.ap_msr_sync_list(), return Outcome::NotSupported);
/// ```
#[macro_export]
macro_rules! slot_or {
    ($slot:expr, $on_unsupported:expr) => {
        match $slot {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Skipping: {}", e);
                $on_unsupported
            }
        }
    };
}
