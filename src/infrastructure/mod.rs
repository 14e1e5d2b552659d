pub mod browser;
pub mod js_executor;

pub use browser::open_page;
pub use js_executor::JsExecutor;
