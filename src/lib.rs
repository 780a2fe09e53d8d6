//! docsite: build a cross-linked HTML documentation site from doclets.
//!
//! Doclets are the symbol records emitted by `jsdoc -X`. The pipeline runs
//! strictly forward: [`normalize`] → [`link`] → [`signature`] →
//! [`members`] → [`nav`] (which also fills the [`search`] index) →
//! [`publish`].

pub mod config;
pub mod html;
pub mod link;
pub mod members;
pub mod model;
pub mod nav;
pub mod normalize;
pub mod publish;
pub mod query;
pub mod render;
pub mod search;
pub mod signature;

pub use config::Config;
pub use model::{parse_doclets, Doclet, Kind};
pub use publish::{publish, PublishOptions, PublishSummary};
