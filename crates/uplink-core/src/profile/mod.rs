//! Device profiles: how to read a frame for one device family.
//!
//! A [`DeviceProfile`] is a name plus a [`TagTable`]. The table maps every
//! recognised (channel, type) [`Tag`] to a [`TagSpec`] (field name, width and
//! [`DecodeRule`]) and carries the family's policy for tags it does not
//! recognise. Families differ only in data, so adding one never touches the
//! frame walk.
//!
//! Profiles are built once, either from the built-in definitions in
//! `builtin` or from JSON configuration, and are immutable afterwards.

pub mod builtin;
pub mod error;
pub mod registry;
pub mod table;
pub mod tag;

pub use builtin::{EM310_UDL, EM500_CO2};
pub use error::{EncodeError, ProfileError};
pub use registry::{DeviceProfile, ProfileConfig, ProfileRegistry, RegistryConfig};
pub use table::{TagTable, TruncatedTagPolicy, UnknownTagPolicy};
pub use tag::{DecodeRule, Tag, TagSpec};
