//! # reqinfo - transport-agnostic HTTP request information
//!
//! `reqinfo` provides [`RequestInformation`], the intermediate representation
//! that generated API client code builds for every call and hands to a pluggable
//! HTTP adapter. It accumulates the target URI, method, headers, query
//! parameters, typed per-request options, and the body.
//!
//! ## Quick Start
//!
//! ```no_run
//! use reqinfo::{HttpMethod, ReqwestAdapter, RequestInformation};
//! use reqinfo::serialization::SerdeModel;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reqinfo::Error> {
//!     let adapter = ReqwestAdapter::builder().build()?;
//!
//!     let mut info = RequestInformation::new();
//!     info.http_method = Some(HttpMethod::Post);
//!     info.set_uri(Some("https://api.example.com"), Some("/users"), false)?;
//!
//!     let user = SerdeModel(CreateUser {
//!         name: "Alice".to_string(),
//!         email: "alice@example.com".to_string(),
//!     });
//!     info.set_content_from_parsable(&adapter, "application/json", &[&user])?;
//!
//!     let response = adapter.send(info).await?;
//!     println!("Status: {}", response.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Raw URLs
//!
//! Some operations receive a complete URL from the server, such as a
//! pagination "next link". Setting it in raw mode splits its query string into
//! the same parameter map that templated calls fill in:
//!
//! ```
//! use reqinfo::RequestInformation;
//!
//! # fn main() -> Result<(), reqinfo::Error> {
//! let mut info = RequestInformation::new();
//! info.set_uri(Some("https://api.example.com/items?page=2&expand"), None, true)?;
//!
//! assert_eq!(info.query_parameters.get("page"), Some(&Some("2".to_string())));
//! assert_eq!(info.query_parameters.get("expand"), Some(&None));
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Templated and raw URI resolution** - absolute or relative, with last-one-wins query parameter merging
//! - **Case-insensitive headers and query parameters**
//! - **Typed request options** - at most one per kind
//! - **Pluggable serialization** - writers selected by content type, JSON included
//! - **`reqwest` adapter** - resolves relative URIs against a base URL, sends the request and returns the raw response
//! - **Telemetry hook** - a per-request or adapter-wide callback that enriches the outgoing request
//! - **Automatic logging** - structured logging with `tracing`

pub mod adapter;
mod case_insensitive;
mod content;
mod error;
mod method;
pub mod options;
mod request_information;
mod response;
pub mod serialization;
mod uri;

pub use adapter::{RequestAdapter, ReqwestAdapter, ReqwestAdapterBuilder, TelemetryOption};
pub use case_insensitive::CaseInsensitiveMap;
pub use content::RequestContent;
pub use error::{BoxError, Error, Result};
pub use method::HttpMethod;
pub use options::{OptionKind, RequestOption, RequestOptions, TimeoutOption};
pub use request_information::{RequestInformation, BINARY_CONTENT_TYPE, CONTENT_TYPE_HEADER};
pub use response::Response;
pub use uri::RequestUri;
