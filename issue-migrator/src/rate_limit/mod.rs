//! Rate limiting for the target API.
//!
//! Every state-changing call (and every import poll) goes through a
//! [`RateLimitedTransport`], which keeps a minimum spacing between calls and
//! waits out rate-limit rejections using the Retry-After header, the quota
//! reset timestamp, or a doubling guess when the server gives no hint.

mod clock;
mod info;
mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use info::{RateLimitInfo, RateLimitSignal};
pub use throttle::{RateLimitedTransport, ThrottleSettings};
