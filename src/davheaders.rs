//! Custom headers that specialized repository clients exchange with the
//! server. Generic DAV clients never send them and ignore them in
//! responses.
use headers::Header;
use http::header::{HeaderName, HeaderValue};
use lazy_static::lazy_static;

use crate::repofs::Revnum;

/// Token in the options header that requests lock stealing / breaking.
pub const OPTION_FORCE: &str = "force";

// helper.
fn one<'i, I>(values: &mut I) -> Result<&'i HeaderValue, headers::Error>
where
    I: Iterator<Item = &'i HeaderValue>,
{
    let v = values.next().ok_or_else(invalid)?;
    if values.next().is_some() {
        Err(invalid())
    } else {
        Ok(v)
    }
}

// helper
fn invalid() -> headers::Error {
    headers::Error::invalid()
}

// helper
fn map_invalid(_e: impl std::error::Error) -> headers::Error {
    headers::Error::invalid()
}

macro_rules! header {
    ($tname:ident, $hname:ident, $sname:expr) => {
        lazy_static! {
            pub static ref $hname: HeaderName = HeaderName::from_static($sname);
        }

        #[derive(Debug, Clone, PartialEq)]
        pub struct $tname(pub String);

        impl Header for $tname {
            fn name() -> &'static HeaderName {
                &$hname
            }

            fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
            where
                I: Iterator<Item = &'i HeaderValue>,
            {
                one(values)?
                    .to_str()
                    .map(|x| $tname(x.to_owned()))
                    .map_err(map_invalid)
            }

            fn encode<E>(&self, values: &mut E)
            where
                E: Extend<HeaderValue>,
            {
                let value = HeaderValue::from_str(&self.0).unwrap();
                values.extend(std::iter::once(value))
            }
        }
    };
}

header!(SvnOptions, X_SVN_OPTIONS, "x-svn-options");
header!(SvnCreationDate, X_SVN_CREATION_DATE, "x-svn-creation-date");

impl SvnOptions {
    /// True if the free-form options string carries the `force` token.
    pub fn has_force(&self) -> bool {
        self.0.contains(OPTION_FORCE)
    }
}

lazy_static! {
    pub static ref X_SVN_VERSION_NAME: HeaderName = HeaderName::from_static("x-svn-version-name");
}

/// The revision the client believes to be current for the resource it
/// is locking, enabling the out-of-dateness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvnVersionName(pub Revnum);

impl Header for SvnVersionName {
    fn name() -> &'static HeaderName {
        &X_SVN_VERSION_NAME
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        one(values)?
            .to_str()
            .map_err(map_invalid)?
            .trim()
            .parse::<Revnum>()
            .map(SvnVersionName)
            .map_err(map_invalid)
    }

    fn encode<E>(&self, values: &mut E)
    where
        E: Extend<HeaderValue>,
    {
        let value = HeaderValue::from_str(&self.0.to_string()).unwrap();
        values.extend(std::iter::once(value))
    }
}
