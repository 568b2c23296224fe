//! Data models for ShareIt

pub mod booking;
pub mod comment;
pub mod enums;
pub mod item;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use booking::{Booking, BookingQuery, BookingShort, BookingSubject, NewBooking};
pub use comment::{CommentDetails, NewComment};
pub use enums::{BookingState, BookingStatus, TimeWindow};
pub use item::{Item, ItemDetails, ItemShort};
pub use page::Page;
pub use user::{User, UserShort};
