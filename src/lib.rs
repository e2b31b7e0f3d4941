//! Parley: a two-agent dialogue engine.
//!
//! A *User* agent pursues a research goal by questioning an *Expert* agent
//! for a fixed number of iterations. The finished dialogue is written out as
//! a transcript and distilled into takeaways by one more model call.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use parley::prelude::*;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let config = AppConfig::load("parley.yaml")?;
//! let provider = Arc::new(config.build_provider()?);
//! let sink = FileOutputSink::new(&config.output_dir)?;
//! let report = run_session(&config.run_config()?, provider, &sink, SessionOptions::default()).await?;
//! println!("{:?}", report.transcript_path);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod output;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
