pub mod is_close;

pub use is_close::IsClose;
