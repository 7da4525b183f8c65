pub mod http_session;

#[cfg(feature = "browser")]
pub mod browser_session;

pub use http_session::HttpSession;

#[cfg(feature = "browser")]
pub use browser_session::ChromeSession;
