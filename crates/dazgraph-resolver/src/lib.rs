//! Lazy cross-file asset resolution for DAZ Studio content.
//!
//! The [`Resolver`] answers "which asset does this reference denote?" for
//! references found anywhere in a DSON scene. It normalizes the reference,
//! consults the session's asset store and, on a miss, locates the owning
//! file through a [`PathResolver`], parses it with a [`FileParser`] and
//! registers everything the file defines before looking again.
//!
//! # Example
//!
//! ```no_run
//! use dazgraph_asset::Session;
//! use dazgraph_common::Settings;
//! use dazgraph_resolver::{DsonParser, FileScope, LibraryPaths, Resolver};
//!
//! let settings = Settings::load("settings.json")?;
//! let mut session = Session::new(settings.clone());
//! let mut resolver = Resolver::new(LibraryPaths::from_settings(&settings), DsonParser::new());
//!
//! // Import a scene, then look up the figure it instantiates
//! let scene = resolver.load_file(&mut session, "Scenes/Victoria.duf".as_ref())?;
//! let scene_ref = session.store()[scene].identity().clone();
//! let scope = FileScope::root(&scene_ref);
//! if let Some(figure) = resolver.resolve(&mut session, "#Genesis8Female", &scope, false)? {
//!     println!("figure: {:?}", session.store()[figure].name());
//! }
//!
//! if let Some(notice) = session.finish() {
//!     eprintln!("{}", notice);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod dson;
mod parser;
mod paths;
mod resolver;
mod scope;

#[cfg(feature = "parallel")]
mod parallel;

pub use parser::{DsonParser, FileParser, InstanceLink, ParsedFile};
pub use paths::{LibraryPaths, PathResolver};
pub use resolver::Resolver;
pub use scope::FileScope;

#[cfg(feature = "parallel")]
pub use parallel::PreloadStats;
