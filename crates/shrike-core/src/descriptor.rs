//! JVM descriptor and binary-name utilities.
//!
//! A class descriptor has the internal form `Lcom/x/A;`; the corresponding
//! binary name is `com/x/A`. Packages are slash-separated prefixes of binary
//! names.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    InvalidDescriptor(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDescriptor(desc) => write!(f, "invalid descriptor: {desc}"),
        }
    }
}

impl std::error::Error for Error {}

/// Separator between package segments in binary names and descriptors.
pub const PACKAGE_SEPARATOR: char = '/';

/// Returns true for `L...;` reference descriptors.
#[inline]
pub fn is_class_descriptor(descriptor: &str) -> bool {
    descriptor.len() > 2 && descriptor.starts_with('L') && descriptor.ends_with(';')
}

/// Returns true for `[`-prefixed array descriptors.
#[inline]
pub fn is_array_descriptor(descriptor: &str) -> bool {
    descriptor.starts_with('[')
}

/// Strips the `L` and `;` from a class descriptor.
pub fn binary_name_from_descriptor(descriptor: &str) -> Result<&str> {
    if !is_class_descriptor(descriptor) {
        return Err(Error::InvalidDescriptor(descriptor.to_string()));
    }
    Ok(&descriptor[1..descriptor.len() - 1])
}

/// The package of a binary name, without a trailing separator. Empty for the
/// default package.
pub fn package_from_binary_name(binary_name: &str) -> &str {
    match binary_name.rfind(PACKAGE_SEPARATOR) {
        Some(i) => &binary_name[..i],
        None => "",
    }
}
