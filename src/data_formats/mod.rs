mod form;
mod request;
mod response;
mod wrapper;

pub use form::*;
pub use request::*;
pub use response::*;
pub use wrapper::*;

/// Number of posts on one listing page.
pub const POSTS_PER_PAGE: u32 = 10;

fn get_default_page() -> u32 {
    1
}
