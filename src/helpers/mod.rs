//! Low-level helpers for reading OOXML packages: package source, zip parts and XML events.
pub(crate) mod reader;
pub(crate) mod xml;
pub(crate) mod zip;
