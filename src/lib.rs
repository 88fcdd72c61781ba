//! Streaming feed conversion utilities.
//!
//! The centerpiece is [`transcode`], which converts an RSS 2.0 (or RDF-based
//! RSS) document into an Atom 1.0 document incrementally: the feed header is
//! written as soon as the channel metadata is complete, and each entry is
//! written as its `</item>` closes. Memory use is bounded by one [`arena`]
//! regardless of document size.
//!
//! The companion modules serve the sibling command-line tools: [`atom`]
//! provides streaming readers over Atom documents (entry-id listing and
//! entry-field extraction), and [`ident`] the filesystem-safe id escaping
//! they share.
//!
//! On top of those sit the subscription tools: [`feeds`] turns a directory
//! of per-feed fetch/open scripts into update, read, and delete operations
//! over the [`db`] entry database.

pub mod arena;
pub mod atom;
pub mod config;
pub mod db;
pub mod feeds;
pub mod ident;
pub mod io;
pub mod transcode;
