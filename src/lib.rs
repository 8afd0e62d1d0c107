//! Bulk download of GlotPress translation sets.
//!
//! Every (translation set x format) file of one or more projects is written
//! to a scratch directory, zipped, and handed back as a single archive,
//! either over HTTP or from the `bulk-export` command line tool.

pub mod admin;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod formats;
pub mod links;
pub mod locales;
pub mod request;
pub mod scheduler;
pub mod security;
pub mod server;

#[cfg(test)]
mod test_support;
