pub mod booking;
pub mod days;
pub mod refund;
pub mod schedule;
pub mod time_info;
pub mod tour;

pub use booking::{Booking, BookingKind, BookingStatus, PaymentStatus};
pub use refund::Refund;
pub use schedule::{ScheduleItem, TourSchedule};
pub use time_info::{NamedSlot, TimeInfo};
pub use tour::TourDetail;
