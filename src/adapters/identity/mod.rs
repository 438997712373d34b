//! Identity adapters.

mod guest_directory;

pub use guest_directory::GuestDirectory;
