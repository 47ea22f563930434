//! Relay endpoint composition.
//!
//! The relay is addressed as `ws(s)://<host>/ws/<room>/<username>?token=<t>`
//! in the room-scoped variant and `ws(s)://<host>/ws/<username>` in the
//! anonymous variant. Path segments are percent-encoded, so room and user
//! names with spaces or slashes stay a single segment.

use url::Url;

use crate::{
    credential::{Credential, RoomAddress},
    error::EndpointError,
};

/// Which flavour of relay endpoint to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Authenticated, one connection per room: `/ws/<room>/<username>?token=`
    #[default]
    RoomScoped,
    /// Unauthenticated, single global room: `/ws/<username>`
    Anonymous,
}

/// Base relay address plus the variant used to compose connection URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
    variant: Variant,
}

impl Endpoint {
    /// Parse a relay base address such as `wss://chat.example.com`.
    ///
    /// # Errors
    ///
    /// - `EndpointError::Invalid` if the address does not parse or cannot
    ///   carry path segments
    /// - `EndpointError::UnsupportedScheme` if the scheme is not `ws`/`wss`
    pub fn parse(base: &str, variant: Variant) -> Result<Self, EndpointError> {
        let url = Url::parse(base).map_err(|e| EndpointError::Invalid {
            address: base.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(EndpointError::UnsupportedScheme(url.scheme().to_string()));
        }

        if url.cannot_be_a_base() {
            return Err(EndpointError::Invalid {
                address: base.to_string(),
                reason: "address cannot carry a path".to_string(),
            });
        }

        Ok(Self { base: url, variant })
    }

    /// Endpoint variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Base address as configured.
    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    /// Compose the connection URL for `address`.
    ///
    /// The room segment is included only for [`Variant::RoomScoped`]. The
    /// token query parameter is included whenever a credential is given.
    pub fn url_for(&self, address: &RoomAddress, credential: Option<&Credential>) -> String {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);

        // Checked in `parse`: a ws/wss base always has path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("ws");
            if self.variant == Variant::RoomScoped {
                segments.push(address.room());
            }
            segments.push(address.username());
        }

        if let Some(credential) = credential {
            url.query_pairs_mut().append_pair("token", &credential.token);
        }

        url.into()
    }
}
