pub mod html;
pub mod retry;
pub mod time;
