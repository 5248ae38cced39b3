use {
    http::*,
    std::{fmt, str::*},
};

//
// Credentials
//

/// Credential-inclusion mode of a request.
///
/// Requests carry it as an [Extensions] entry. A request without one is treated as
/// [SameOrigin](Credentials::SameOrigin).
///
/// It is part of the coalescing key: identical requests with different credential modes may
/// receive different responses and so are never coalesced.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Credentials {
    /// Never send credentials.
    Omit,

    /// Send credentials only to the same origin.
    #[default]
    SameOrigin,

    /// Always send credentials.
    Include,
}

impl Credentials {
    /// As string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Omit => "omit",
            Self::SameOrigin => "same-origin",
            Self::Include => "include",
        }
    }

    /// From request extensions, falling back to the default.
    pub fn for_extensions(extensions: &Extensions) -> Self {
        extensions.get::<Self>().copied().unwrap_or_default()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Credentials {
    type Err = UnknownCredentialsError;

    fn from_str(representation: &str) -> std::result::Result<Self, Self::Err> {
        match representation {
            "omit" => Ok(Self::Omit),
            "same-origin" => Ok(Self::SameOrigin),
            "include" => Ok(Self::Include),
            _ => Err(UnknownCredentialsError(representation.into())),
        }
    }
}

//
// UnknownCredentialsError
//

/// Unknown credentials mode.
#[derive(Debug, thiserror::Error)]
#[error("unknown credentials mode: {0}")]
pub struct UnknownCredentialsError(pub String);
