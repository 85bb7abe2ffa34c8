pub mod cache;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod exception;
pub mod handler;
pub mod param;
pub mod request;
pub mod response;
pub mod route;
pub mod server;
pub mod static_files;
pub mod util;

pub use config::Config;
pub use context::Context;
pub use exception::{DispatchFault, Exception};
pub use handler::{Handler, IntoHandler, IntoReply, Reply};
pub use param::{HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::{Response, ResponseWriter};
pub use route::RouteTable;
pub use server::{Server, ServerHandle};
pub use static_files::{StaticDir, StaticFiles};
