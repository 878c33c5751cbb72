//! Typed arena handles.

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Handle to a [`Class`](super::Class).
    ClassId
);
arena_id!(
    /// Handle to a [`Domain`](super::Domain).
    DomainId
);
arena_id!(
    /// Handle to an [`Endpoint`](super::Endpoint).
    EndpointId
);
arena_id!(
    /// Handle to a [`Property`](super::Property).
    PropertyId
);
