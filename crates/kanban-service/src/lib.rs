mod advice;
mod blocking;
mod http;
mod local;
mod traits;

pub use advice::{AdviceError, AdviceErrorKind, AdviceProvider};
pub use blocking::BlockingHttpService;
pub use http::HttpService;
pub use local::LocalService;
pub use traits::{ServiceError, TaskService};
