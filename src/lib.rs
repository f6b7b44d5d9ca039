//! # docfill
//!
//! Fill `{{placeholder}}` document templates and render the result to PDF.
//!
//! An admin uploads one template (DOCX or plain text). Users get a form with
//! one input per placeholder plus a mandatory output name, and receive
//! `<output name>.pdf` with the placeholders replaced.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docfill::app::App;
//! use docfill::config::Config;
//! use docfill::form::Submission;
//!
//! let config = Config {
//!     admin_secret: Some("letmein".into()),
//!     ..Config::default()
//! };
//! let app = App::from_config(&config);
//!
//! let template = std::fs::read("offer.docx").unwrap();
//! let fields = app.admin("letmein").unwrap().upload(&template).unwrap();
//! println!("fields: {:?}", fields);
//!
//! let doc = app
//!     .generate(&Submission::new().with_value("Name", "Ann").with_output_name("offer-ann"))
//!     .unwrap();
//! doc.deliver_to_dir(std::path::Path::new("out")).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`placeholder`]: scanning and substitution of `{{name}}` tokens
//! - [`docx`]: text extraction from DOCX and plain-text templates
//! - [`store`]: the single active-template slot
//! - [`form`]: generated form, submissions and output-name validation
//! - [`pdf_generator`]: line-by-line pagination and PDF assembly
//! - [`pdf`]: WinAnsi string encoding and structural PDF checks
//! - [`app`]: the request flow behind the admin gate
//! - [`config`]: runtime configuration

pub mod app;
pub mod config;
pub mod docx;
pub mod error;
pub mod form;
pub mod pdf;
pub mod pdf_generator;
pub mod placeholder;
pub mod store;

pub use error::{DocfillError, Result};
